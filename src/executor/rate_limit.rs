//! Client-side HTTP 429 bookkeeping: the shared gate and the hints parsed from a 429 response.

// crates.io
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::RateLimitError, http::ApiResponse};

/// Shared "do not call before" marker for one client instance.
///
/// Set when a 429 carries a resolvable reset time, cleared by the next successful response or
/// lazily once the instant has passed. While it points to the future the executor fails fast
/// without touching the network.
#[derive(Debug, Default)]
pub struct RateLimitGate {
	blocked_until: Mutex<Option<OffsetDateTime>>,
}
impl RateLimitGate {
	/// Instant the gate lifts, if it is set.
	pub fn blocked_until(&self) -> Option<OffsetDateTime> {
		*self.blocked_until.lock()
	}

	/// Returns the error to report when the gate is still closed at `now`, clearing it otherwise.
	pub fn check(&self, now: OffsetDateTime) -> Option<RateLimitError> {
		let mut blocked_until = self.blocked_until.lock();

		match *blocked_until {
			Some(until) if until > now =>
				Some(RateLimitError { retry_after: until - now, reset_at: Some(until), remaining: None }),
			Some(_) => {
				*blocked_until = None;

				None
			},
			None => None,
		}
	}

	/// Closes the gate until `instant`; an existing later deadline wins.
	pub fn block_until(&self, instant: OffsetDateTime) {
		let mut blocked_until = self.blocked_until.lock();

		*blocked_until = Some(blocked_until.map_or(instant, |current| current.max(instant)));
	}

	/// Opens the gate.
	pub fn clear(&self) {
		self.blocked_until.lock().take();
	}
}

/// Longest reset wait honoured from a server hint; larger values are clamped to it.
pub const MAX_RESET_WAIT: Duration = Duration::DAY;

/// Reset hints extracted from a 429 response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RateLimitSignal {
	/// Wait until the quota resets.
	pub resets_in: Option<Duration>,
	/// Remaining request quota.
	pub remaining: Option<u64>,
}
impl RateLimitSignal {
	/// Reads `resetsIn`/`remaining` from the body (top level or under `rateLimit`), falling back to
	/// the `Retry-After` header for the reset.
	pub fn from_response(response: &ApiResponse, now: OffsetDateTime) -> Self {
		let body = serde_json::from_slice::<Value>(&response.body).ok();
		let limits = body.as_ref().and_then(|body| match body.get("rateLimit") {
			Some(nested @ Value::Object(_)) => Some(nested),
			_ => body.is_object().then_some(body),
		});
		let resets_in = limits
			.and_then(|limits| limits.get("resetsIn"))
			.and_then(Value::as_f64)
			.filter(|secs| secs.is_finite())
			.map(|secs| Duration::seconds_f64(secs.clamp(0., MAX_RESET_WAIT.as_seconds_f64())));
		let remaining = limits.and_then(|limits| limits.get("remaining")).and_then(Value::as_u64);
		let resets_in =
			resets_in.or_else(|| response.header("retry-after").and_then(|raw| parse_retry_after(raw, now)));

		Self { resets_in, remaining }
	}

	/// Absolute reset instant relative to `now`; `None` when it is not representable.
	pub fn reset_at(&self, now: OffsetDateTime) -> Option<OffsetDateTime> {
		self.resets_in.and_then(|wait| now.checked_add(wait))
	}
}

fn parse_retry_after(raw: &str, now: OffsetDateTime) -> Option<Duration> {
	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(i64::try_from(secs).map_or(MAX_RESET_WAIT, |secs| {
			Duration::seconds(secs).min(MAX_RESET_WAIT)
		}));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		return Some((moment - now).clamp(Duration::ZERO, MAX_RESET_WAIT));
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn response(body: &str, headers: &[(&str, &str)]) -> ApiResponse {
		ApiResponse {
			status: 429,
			headers: headers.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect(),
			body: body.as_bytes().to_vec(),
		}
	}

	#[test]
	fn reads_top_level_and_nested_hints() {
		let now = OffsetDateTime::now_utc();
		let top = RateLimitSignal::from_response(&response(r#"{"resetsIn":30,"remaining":0}"#, &[]), now);
		let nested = RateLimitSignal::from_response(
			&response(r#"{"message":"slow down","rateLimit":{"resetsIn":1.5,"remaining":3}}"#, &[]),
			now,
		);

		assert_eq!(top, RateLimitSignal { resets_in: Some(Duration::seconds(30)), remaining: Some(0) });
		assert_eq!(nested.resets_in, Some(Duration::milliseconds(1_500)));
		assert_eq!(nested.remaining, Some(3));
		assert_eq!(nested.reset_at(now), Some(now + Duration::milliseconds(1_500)));
	}

	#[test]
	fn falls_back_to_retry_after_header() {
		let now = macros::datetime!(2024-03-01 12:00:00 UTC);
		let seconds = RateLimitSignal::from_response(&response("", &[("Retry-After", "7")]), now);
		let date = RateLimitSignal::from_response(
			&response("not json", &[("retry-after", "Fri, 01 Mar 2024 12:00:20 +0000")]),
			now,
		);
		let nothing = RateLimitSignal::from_response(&response("{}", &[]), now);

		assert_eq!(seconds.resets_in, Some(Duration::seconds(7)));
		assert_eq!(date.resets_in, Some(Duration::seconds(20)));
		assert_eq!(nothing, RateLimitSignal::default());
	}

	#[test]
	fn oversized_hints_are_clamped() {
		let now = macros::datetime!(2024-03-01 12:00:00 UTC);
		let body = RateLimitSignal::from_response(&response(r#"{"resetsIn":1e12}"#, &[]), now);
		let header = RateLimitSignal::from_response(
			&response("", &[("Retry-After", "18446744073709551615")]),
			now,
		);
		let signed = RateLimitSignal::from_response(
			&response("", &[("Retry-After", "9223372036854775807")]),
			now,
		);

		assert_eq!(body.resets_in, Some(MAX_RESET_WAIT));
		assert_eq!(header.resets_in, Some(MAX_RESET_WAIT));
		assert_eq!(signed.resets_in, Some(MAX_RESET_WAIT));
		assert_eq!(body.reset_at(now), Some(now + MAX_RESET_WAIT));
	}

	#[test]
	fn unrepresentable_reset_instant_is_none() {
		let signal = RateLimitSignal { resets_in: Some(Duration::MAX), remaining: None };

		assert_eq!(signal.reset_at(macros::datetime!(2024-03-01 12:00:00 UTC)), None);
	}

	#[test]
	fn gate_reports_remaining_wait_and_lifts_itself() {
		let gate = RateLimitGate::default();
		let now = macros::datetime!(2024-03-01 12:00:00 UTC);

		assert!(gate.check(now).is_none());

		gate.block_until(now + Duration::seconds(30));
		gate.block_until(now + Duration::seconds(10));

		let err = gate.check(now + Duration::seconds(5)).expect("Gate should still be closed.");

		assert_eq!(err.retry_after, Duration::seconds(25));
		assert_eq!(err.reset_at, Some(now + Duration::seconds(30)));
		assert!(gate.check(now + Duration::seconds(30)).is_none());
		assert!(gate.blocked_until().is_none(), "An expired gate should clear itself.");
	}
}
