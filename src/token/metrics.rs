// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for token acquisition.
#[derive(Debug, Default)]
pub struct TokenMetrics {
	cache_hits: AtomicU64,
	refreshes: AtomicU64,
	authentications: AtomicU64,
	failures: AtomicU64,
}
impl TokenMetrics {
	/// Returns how often a cached access token was handed out without a network call.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of successful refresh-token exchanges.
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of successful client-credential authentications.
	pub fn authentications(&self) -> u64 {
		self.authentications.load(Ordering::Relaxed)
	}

	/// Returns the number of failed token acquisitions.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_authentication(&self) {
		self.authentications.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
