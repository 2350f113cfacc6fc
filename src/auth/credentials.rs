//! Immutable client-credential pair used to mint tokens.

// self
use crate::{_prelude::*, auth::Secret};

/// `clientId` / `clientSecret` pair issued by the Monta portal; never expires.
#[derive(Clone)]
pub struct Credentials {
	client_id: String,
	client_secret: Secret,
}
impl Credentials {
	/// Creates a new credential pair.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<Secret>) -> Self {
		Self { client_id: client_id.into(), client_secret: client_secret.into() }
	}

	/// Returns the public client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Returns the client secret.
	pub fn client_secret(&self) -> &Secret {
		&self.client_secret
	}

	/// Request body for `POST auth/token`.
	pub(crate) fn token_request_body(&self) -> Value {
		serde_json::json!({
			"clientId": self.client_id,
			"clientSecret": self.client_secret.expose(),
		})
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.finish()
	}
}
