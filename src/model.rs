//! Immutable value objects parsed from API payloads.
//!
//! Objects never reference the client; relationships are expressed by integer identifiers.

pub mod charge;
pub mod charge_point;
pub mod status;
pub mod timestamp;
pub mod token;
pub mod wallet;

pub use charge::*;
pub use charge_point::*;
pub use status::*;
pub use token::*;
pub use wallet::*;

// crates.io
use serde::Deserializer;
// self
use crate::_prelude::*;

/// `{ "data": [...] }` envelope used by listing endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ListEnvelope<T> {
	pub data: Option<Vec<T>>,
}

/// Deserializes `null` as the type's default, matching the API's habit of nulling strings.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sorts by descending identifier so the most recent entry comes first.
pub(crate) fn newest_first<T>(items: &mut [T], id: impl Fn(&T) -> i64) {
	items.sort_by_key(|item| std::cmp::Reverse(id(item)));
}
