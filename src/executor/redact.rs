//! Masks private fields before response bodies reach the logs.

// self
use crate::_prelude::*;

/// Keys whose values never appear in logs.
pub const PRIVATE_FIELDS: [&str; 8] = [
	"accessToken",
	"refreshToken",
	"serialNumber",
	"latitude",
	"longitude",
	"address1",
	"address2",
	"address3",
];

/// Returns a copy of `value` with every private scalar replaced by a same-length `*` mask.
///
/// Objects and arrays stored under a private key are walked rather than masked wholesale; `null`
/// stays `null`.
pub fn redact(value: &Value) -> Value {
	match value {
		Value::Object(map) => Value::Object(
			map.iter()
				.map(|(key, value)| {
					let value = if PRIVATE_FIELDS.contains(&key.as_str()) {
						mask(value)
					} else {
						redact(value)
					};

					(key.clone(), value)
				})
				.collect(),
		),
		Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
		scalar => scalar.clone(),
	}
}

fn mask(value: &Value) -> Value {
	let len = match value {
		Value::Null => return Value::Null,
		Value::Object(_) | Value::Array(_) => return redact(value),
		Value::String(text) => text.chars().count(),
		scalar => scalar.to_string().chars().count(),
	};

	Value::String("*".repeat(len))
}
