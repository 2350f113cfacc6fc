//! Async client for the Monta EV-charging public API: a serialised token lifecycle with
//! preemptive refresh, redacted request logging, and client-side rate-limit gating.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod model;
pub mod obs;
pub mod poll;
pub mod store;
pub mod token;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and a scripted transport for tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		auth::Credentials,
		client::MontaClient,
		config::ClientConfig,
		error::TransportError,
		http::{ApiRequest, ApiResponse, HttpTransport, TransportFuture},
		store::{MemoryTokenStorage, TokenStorage},
	};

	/// Client type alias used by scripted unit tests.
	pub type ScriptedClient = MontaClient<ScriptedTransport>;

	/// Single canned reply served by [`ScriptedTransport`].
	#[derive(Debug)]
	pub enum ScriptedReply {
		/// Respond with the given status and JSON body.
		Json {
			/// HTTP status code.
			status: u16,
			/// Response body.
			body: serde_json::Value,
			/// Simulated server latency.
			delay: Option<std::time::Duration>,
		},
		/// Fail at the transport layer, as a refused connection would.
		Fail(String),
	}

	/// In-process [`HttpTransport`] that replays queued replies in order and records every
	/// request it sees.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		replies: Mutex<VecDeque<ScriptedReply>>,
		requests: Mutex<Vec<ApiRequest>>,
	}
	impl ScriptedTransport {
		/// Queues a JSON reply.
		pub fn push_json(&self, status: u16, body: serde_json::Value) -> &Self {
			self.replies.lock().push_back(ScriptedReply::Json { status, body, delay: None });

			self
		}

		/// Queues a JSON reply that resolves after `delay`.
		pub fn push_delayed(
			&self,
			delay: std::time::Duration,
			status: u16,
			body: serde_json::Value,
		) -> &Self {
			self.replies.lock().push_back(ScriptedReply::Json { status, body, delay: Some(delay) });

			self
		}

		/// Queues a transport-level failure.
		pub fn push_failure(&self, message: impl Into<String>) -> &Self {
			self.replies.lock().push_back(ScriptedReply::Fail(message.into()));

			self
		}

		/// Returns every request observed so far.
		pub fn requests(&self) -> Vec<ApiRequest> {
			self.requests.lock().clone()
		}

		/// Returns the number of requests observed so far.
		pub fn request_count(&self) -> usize {
			self.requests.lock().len()
		}
	}
	impl HttpTransport for ScriptedTransport {
		fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
			self.requests.lock().push(request);

			let reply = self.replies.lock().pop_front();

			Box::pin(async move {
				match reply {
					Some(ScriptedReply::Json { status, body, delay }) => {
						if let Some(delay) = delay {
							tokio::time::sleep(delay).await;
						}

						let body = if body.is_null() {
							Vec::new()
						} else {
							serde_json::to_vec(&body).map_err(TransportError::network)?
						};

						Ok(ApiResponse {
							status,
							headers: vec![("content-type".into(), "application/json".into())],
							body,
						})
					},
					Some(ScriptedReply::Fail(message)) =>
						Err(TransportError::network(std::io::Error::other(message))),
					None => Err(TransportError::network(std::io::Error::other(
						"Scripted transport has no reply queued.",
					))),
				}
			})
		}
	}

	/// Builds a client over a fresh [`ScriptedTransport`] and [`MemoryTokenStorage`].
	pub fn build_scripted_client(
		config: ClientConfig,
	) -> (ScriptedClient, Arc<ScriptedTransport>, Arc<MemoryTokenStorage>) {
		let transport = Arc::new(ScriptedTransport::default());
		let storage = Arc::new(MemoryTokenStorage::default());
		let dyn_storage: Arc<dyn TokenStorage> = storage.clone();
		let client = MontaClient::with_transport(
			Credentials::new("client-id", "client-secret"),
			dyn_storage,
			transport.clone(),
			config,
		)
		.expect("Scripted client configuration should be valid.");

		(client, transport, storage)
	}

	/// Token endpoint payload whose tokens expire `access_in` / `refresh_in` from now.
	pub fn token_payload(
		access: &str,
		access_in: Duration,
		refresh: &str,
		refresh_in: Duration,
	) -> serde_json::Value {
		let now = OffsetDateTime::now_utc();
		let format = |instant: OffsetDateTime| {
			instant
				.format(&time::format_description::well_known::Rfc3339)
				.expect("Test timestamps should format as RFC 3339.")
		};

		serde_json::json!({
			"accessToken": access,
			"accessTokenExpirationDate": format(now + access_in),
			"refreshToken": refresh,
			"refreshTokenExpirationDate": format(now + refresh_in),
			"userId": "user-1",
		})
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
pub use {
	auth::Credentials,
	client::MontaClient,
	config::{ClientConfig, RateLimitConfig},
	error::{Error, Result},
};
#[cfg(test)] use {color_eyre as _, httpmock as _};
