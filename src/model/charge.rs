//! Charging sessions.

// self
use crate::{
	_prelude::*,
	model::{null_default, timestamp},
};

/// One charging session at a charge point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
	/// Charge identifier; higher is more recent.
	pub id: i64,
	/// Session state label (e.g. `charging`, `completed`).
	#[serde(default, deserialize_with = "null_default")]
	pub state: String,
	/// Creation instant.
	#[serde(default, with = "timestamp::lenient")]
	pub created_at: Option<OffsetDateTime>,
	/// Last update instant.
	#[serde(default, with = "timestamp::lenient")]
	pub updated_at: Option<OffsetDateTime>,
	/// Instant energy started flowing.
	#[serde(default, with = "timestamp::lenient")]
	pub started_at: Option<OffsetDateTime>,
	/// Instant the session was stopped.
	#[serde(default, with = "timestamp::lenient")]
	pub stopped_at: Option<OffsetDateTime>,
	/// Instant the cable was plugged in.
	#[serde(default, with = "timestamp::lenient")]
	pub cable_plugged_in_at: Option<OffsetDateTime>,
	/// Instant the vehicle reported full.
	#[serde(default, with = "timestamp::lenient")]
	pub fully_charged_at: Option<OffsetDateTime>,
	/// Instant the session failed.
	#[serde(default, with = "timestamp::lenient")]
	pub failed_at: Option<OffsetDateTime>,
	/// Instant the session timed out.
	#[serde(default, with = "timestamp::lenient")]
	pub timeout_at: Option<OffsetDateTime>,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn parses_sparse_payloads() {
		let charge: Charge = serde_json::from_value(serde_json::json!({
			"id": 105,
			"state": null,
			"startedAt": "2024-03-01T12:30:00Z",
			"stoppedAt": null,
			"kwh": 12.5,
		}))
		.expect("Sparse charge payload should parse.");

		assert_eq!(charge.id, 105);
		assert_eq!(charge.state, "");
		assert_eq!(charge.started_at, Some(macros::datetime!(2024-03-01 12:30 UTC)));
		assert!(charge.stopped_at.is_none());
		assert!(charge.created_at.is_none());
	}
}
