//! Persisted token state and the reuse/refresh/authenticate decision.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	model::{TokenResponse, timestamp},
};

/// A token secret paired with its expiry; the pair is always set or unset together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
	/// Token value.
	pub secret: Secret,
	/// Instant the server stops accepting the token.
	pub expires_at: OffsetDateTime,
}
impl IssuedToken {
	/// Pairs a token with its expiry.
	pub fn new(secret: impl Into<Secret>, expires_at: OffsetDateTime) -> Self {
		Self { secret: secret.into(), expires_at }
	}

	/// Lifetime left at `now` (negative once expired).
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		self.expires_at - now
	}

	/// Returns `true` when more than `window` of lifetime remains at `now`.
	pub fn is_usable_at(&self, now: OffsetDateTime, window: Duration) -> bool {
		!self.secret.is_empty() && self.remaining_at(now) > window
	}
}

/// Cheapest operation able to produce a usable access token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenAction {
	/// Cached access token is still usable.
	Reuse(Secret),
	/// Access token is stale but the refresh token can mint a new one.
	Refresh(Secret),
	/// Neither token is usable; mint both from client credentials.
	Authenticate,
}

/// Access/refresh token pair plus whatever housekeeping keys the host stored alongside them.
///
/// Persisted as a flat JSON object (`access_token`, `access_token_expiration`, `refresh_token`,
/// `refresh_token_expiration`, plus any extra keys). A token whose value or expiry is missing
/// from storage is loaded as unset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredTokenState", into = "StoredTokenState")]
pub struct TokenState {
	/// Short-lived bearer credential.
	pub access: Option<IssuedToken>,
	/// Longer-lived credential used to mint new access tokens.
	pub refresh: Option<IssuedToken>,
	/// Extra keys preserved across load/save round trips.
	pub metadata: Map<String, Value>,
}
impl TokenState {
	/// Decides what [`TokenManager`](crate::token::TokenManager) must do to hand out a token
	/// usable for more than `window`.
	pub fn next_action(&self, now: OffsetDateTime, window: Duration) -> TokenAction {
		if let Some(access) = self.access.as_ref().filter(|t| t.is_usable_at(now, window)) {
			return TokenAction::Reuse(access.secret.clone());
		}
		if let Some(refresh) = self.refresh.as_ref().filter(|t| t.is_usable_at(now, window)) {
			return TokenAction::Refresh(refresh.secret.clone());
		}

		TokenAction::Authenticate
	}

	/// Replaces both tokens with the ones carried by `response`.
	pub fn apply(&mut self, response: &TokenResponse) {
		self.access = Some(IssuedToken::new(
			response.access_token.clone(),
			response.access_token_expiration_date,
		));
		self.refresh = Some(IssuedToken::new(
			response.refresh_token.clone(),
			response.refresh_token_expiration_date,
		));
	}
}

#[derive(Clone, Default, Serialize, Deserialize)]
struct StoredTokenState {
	#[serde(default)]
	access_token: Option<Secret>,
	#[serde(default, with = "timestamp::lenient")]
	access_token_expiration: Option<OffsetDateTime>,
	#[serde(default)]
	refresh_token: Option<Secret>,
	#[serde(default, with = "timestamp::lenient")]
	refresh_token_expiration: Option<OffsetDateTime>,
	#[serde(flatten)]
	metadata: Map<String, Value>,
}
impl From<StoredTokenState> for TokenState {
	fn from(stored: StoredTokenState) -> Self {
		let pair = |secret: Option<Secret>, expiry: Option<OffsetDateTime>| match (secret, expiry) {
			(Some(secret), Some(expires_at)) if !secret.is_empty() =>
				Some(IssuedToken::new(secret, expires_at)),
			_ => None,
		};

		Self {
			access: pair(stored.access_token, stored.access_token_expiration),
			refresh: pair(stored.refresh_token, stored.refresh_token_expiration),
			metadata: stored.metadata,
		}
	}
}
impl From<TokenState> for StoredTokenState {
	fn from(state: TokenState) -> Self {
		let (access_token, access_token_expiration) = split(state.access);
		let (refresh_token, refresh_token_expiration) = split(state.refresh);

		Self {
			access_token,
			access_token_expiration,
			refresh_token,
			refresh_token_expiration,
			metadata: state.metadata,
		}
	}
}

fn split(token: Option<IssuedToken>) -> (Option<Secret>, Option<OffsetDateTime>) {
	match token {
		Some(IssuedToken { secret, expires_at }) => (Some(secret), Some(expires_at)),
		None => (None, None),
	}
}
