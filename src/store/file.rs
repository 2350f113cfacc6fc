//! JSON-file [`TokenStorage`] for single-host deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::TokenState,
	store::{StoreError, StoreFuture, TokenStorage},
};

/// Persists the token state to a JSON file, replacing it atomically on every save.
#[derive(Clone, Debug)]
pub struct FileTokenStorage {
	path: PathBuf,
	write_lock: Arc<Mutex<()>>,
}
impl FileTokenStorage {
	/// Uses `path` for storage, creating parent directories on demand.
	pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path, write_lock: Default::default() })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_state(path: &Path) -> Result<Option<TokenState>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create storage directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn write_state(&self, state: &TokenState) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock();

		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(state).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize token state: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStorage for FileTokenStorage {
	fn load(&self) -> StoreFuture<'_, Option<TokenState>> {
		Box::pin(async move { Self::read_state(&self.path) })
	}

	fn save<'a>(&'a self, state: &'a TokenState) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.write_state(state) })
	}
}
