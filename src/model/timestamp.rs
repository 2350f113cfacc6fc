//! Timestamp normalisation for API payloads and persisted token state.
//!
//! The API emits ISO-8601 strings (`Z`, explicit offsets, occasionally naive local-free values),
//! while host storage may hold either those strings or numeric Unix timestamps. Everything is
//! normalised to UTC [`OffsetDateTime`] values and written back as RFC 3339.

// crates.io
use serde::{Deserializer, Serializer, de::Error as _, ser::Error as _};
use time::{
	PrimitiveDateTime, UtcOffset,
	format_description::well_known::{Iso8601, Rfc3339},
};
// self
use crate::_prelude::*;

/// Parses an ISO-8601 / RFC 3339 timestamp; values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
	let raw = raw.trim();
	let parsed = OffsetDateTime::parse(raw, &Rfc3339)
		.or_else(|_| OffsetDateTime::parse(raw, &Iso8601::DEFAULT))
		.or_else(|_| PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT).map(|dt| dt.assume_utc()))?;

	Ok(parsed.to_offset(UtcOffset::UTC))
}

/// Formats a timestamp as RFC 3339.
pub fn format_timestamp(instant: OffsetDateTime) -> Result<String, time::error::Format> {
	instant.to_offset(UtcOffset::UTC).format(&Rfc3339)
}

/// Timestamp as it may appear on the wire or in storage.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
	Text(String),
	Seconds(i64),
	FractionalSeconds(f64),
}
impl RawTimestamp {
	fn resolve(self) -> Result<Option<OffsetDateTime>, String> {
		match self {
			Self::Text(text) if text.trim().is_empty() => Ok(None),
			Self::Text(text) =>
				parse_timestamp(&text).map(Some).map_err(|e| format!("invalid timestamp `{text}`: {e}")),
			Self::Seconds(secs) => OffsetDateTime::from_unix_timestamp(secs)
				.map(Some)
				.map_err(|e| format!("invalid Unix timestamp {secs}: {e}")),
			Self::FractionalSeconds(secs) => {
				let nanos = (secs * 1_000_000_000.) as i128;

				OffsetDateTime::from_unix_timestamp_nanos(nanos)
					.map(Some)
					.map_err(|e| format!("invalid Unix timestamp {secs}: {e}"))
			},
		}
	}
}

/// Required timestamp; malformed or missing values are errors.
pub(crate) mod required {
	// self
	use super::*;

	pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&format_timestamp(*value).map_err(S::Error::custom)?)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
	where
		D: Deserializer<'de>,
	{
		RawTimestamp::deserialize(deserializer)?
			.resolve()
			.map_err(D::Error::custom)?
			.ok_or_else(|| D::Error::custom("timestamp must not be empty"))
	}
}

/// Optional timestamp; malformed values degrade to `None`.
pub(crate) mod lenient {
	// self
	use super::*;

	pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(instant) =>
				serializer.serialize_str(&format_timestamp(*instant).map_err(S::Error::custom)?),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = Option::<Value>::deserialize(deserializer)?;

		Ok(raw
			.and_then(|value| serde_json::from_value::<RawTimestamp>(value).ok())
			.and_then(|raw| raw.resolve().ok().flatten()))
	}
}
