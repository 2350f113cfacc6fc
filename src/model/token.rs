//! Token endpoint payloads.

// self
use crate::{_prelude::*, auth::Secret, model::timestamp};

/// Body returned by `POST auth/token` and `POST auth/refresh`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
	/// New access token.
	pub access_token: Secret,
	/// Access token expiry.
	#[serde(with = "timestamp::required")]
	pub access_token_expiration_date: OffsetDateTime,
	/// New refresh token.
	pub refresh_token: Secret,
	/// Refresh token expiry.
	#[serde(with = "timestamp::required")]
	pub refresh_token_expiration_date: OffsetDateTime,
	/// Account the tokens belong to.
	#[serde(default)]
	pub user_id: Option<Value>,
}
