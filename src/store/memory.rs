//! In-process [`TokenStorage`] for tests, demos, and hosts without persistence.

// self
use crate::{
	_prelude::*,
	auth::TokenState,
	store::{StoreFuture, TokenStorage},
};

/// Keeps the token state in memory; it is lost when the process exits.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStorage(Arc<Mutex<Option<TokenState>>>);
impl MemoryTokenStorage {
	/// Creates a storage pre-seeded with `state`, as if a previous run had saved it.
	pub fn seeded(state: TokenState) -> Self {
		Self(Arc::new(Mutex::new(Some(state))))
	}

	/// Returns the last saved state without going through the async contract.
	pub fn snapshot(&self) -> Option<TokenState> {
		self.0.lock().clone()
	}
}
impl TokenStorage for MemoryTokenStorage {
	fn load(&self) -> StoreFuture<'_, Option<TokenState>> {
		let state = self.0.lock().clone();

		Box::pin(async move { Ok(state) })
	}

	fn save<'a>(&'a self, state: &'a TokenState) -> StoreFuture<'a, ()> {
		*self.0.lock() = Some(state.clone());

		Box::pin(async { Ok(()) })
	}
}
