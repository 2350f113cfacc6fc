//! Adaptive poll intervals for hosts that refresh client data on a timer.
//!
//! The client itself never schedules anything. A host coordinator keeps one [`PollBackoff`] per
//! cadence, feeds it every refresh result, and sleeps for [`PollBackoff::current`] before the next
//! cycle. Rate limits widen the interval; the next success snaps it back to the baseline.

// self
use crate::_prelude::*;

/// Poll interval that backs off while the API is rate limiting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollBackoff {
	baseline: Duration,
	max: Duration,
	current: Duration,
}
impl PollBackoff {
	/// Baseline for charge-point (and charge) refreshes.
	pub const CHARGE_POINTS: Duration = Duration::seconds(120);
	/// Upper bound applied unless overridden.
	pub const DEFAULT_MAX: Duration = Duration::seconds(3_600);
	/// Baseline for wallet-transaction refreshes.
	pub const TRANSACTIONS: Duration = Duration::seconds(600);
	/// Baseline for wallet refreshes.
	pub const WALLET: Duration = Duration::seconds(600);

	/// Starts at `baseline` with the default cap.
	pub fn new(baseline: Duration) -> Self {
		let baseline = baseline.max(Duration::ZERO);

		Self { baseline, max: Self::DEFAULT_MAX.max(baseline), current: baseline }
	}

	/// Overrides the cap; it never drops below the baseline.
	pub fn with_max(mut self, max: Duration) -> Self {
		self.max = max.max(self.baseline);
		self.current = self.current.min(self.max);

		self
	}

	/// Interval to wait before the next poll.
	pub fn current(&self) -> Duration {
		self.current
	}

	/// Interval used while the API is healthy.
	pub fn baseline(&self) -> Duration {
		self.baseline
	}

	/// Returns to the baseline.
	pub fn on_success(&mut self) -> Duration {
		self.current = self.baseline;

		self.current
	}

	/// Widens to the larger of twice the current interval and the server's wait, capped.
	pub fn on_rate_limited(&mut self, retry_after: Duration) -> Duration {
		let doubled = self.current.checked_mul(2).unwrap_or(self.max);

		self.current = doubled.max(retry_after).min(self.max);

		tracing::warn!(interval = %self.current, %retry_after, "Widening poll interval.");

		self.current
	}

	/// Widens on rate limits; any other failure leaves the interval alone.
	pub fn on_error(&mut self, error: &Error) -> Duration {
		match error {
			Error::RateLimit(e) => self.on_rate_limited(e.retry_after),
			_ => self.current,
		}
	}

	/// Feeds a refresh result and returns the interval to wait next.
	pub fn observe<T>(&mut self, result: &Result<T>) -> Duration {
		match result {
			Ok(_) => self.on_success(),
			Err(e) => self.on_error(e),
		}
	}
}
