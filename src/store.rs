//! Token persistence contract and built-in storage backends.

pub mod file;
pub mod memory;

pub use file::FileTokenStorage;
pub use memory::MemoryTokenStorage;

// self
use crate::{_prelude::*, auth::TokenState};

/// Boxed future returned by [`TokenStorage`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence capability the host application provides for the token state.
///
/// The client loads once on first use and saves after every token mutation; the medium is up to
/// the implementation.
pub trait TokenStorage
where
	Self: Send + Sync,
{
	/// Loads the persisted state, or `None` when nothing was stored yet.
	fn load(&self) -> StoreFuture<'_, Option<TokenState>>;

	/// Persists (replaces) the state.
	fn save<'a>(&'a self, state: &'a TokenState) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStorage`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
