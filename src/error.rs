//! Client-level error types shared by the executor, token manager, and domain operations.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Timeout, network failure, or unexpected HTTP status; retry on the next poll.
	#[error(transparent)]
	Communication(#[from] CommunicationError),
	/// The API (or the local gate) asked the caller to slow down.
	#[error(transparent)]
	RateLimit(#[from] RateLimitError),

	/// Credentials or tokens were rejected (HTTP 401/403); never retried automatically.
	#[error("Monta API rejected the credentials: {reason}.")]
	Authentication {
		/// Endpoint and status that triggered the rejection.
		reason: String,
	},
	/// Response body could not be decoded into the expected shape.
	#[error("Response from `{path}` could not be decoded.")]
	ResponseParse {
		/// Endpoint path that produced the body.
		path: String,
		/// Structured parsing failure, including the JSON path that failed.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Anything else; the original cause is preserved for diagnostics.
	#[error("Unexpected client failure: {message}.")]
	Unexpected {
		/// Human-readable context.
		message: String,
		/// Original failure.
		#[source]
		source: BoxError,
	},
	/// A charge action was requested while the charge point is in the wrong state.
	#[error("Cannot {action} charging: charger is in state `{state}`, expected `{expected}`.")]
	InvalidState {
		/// Requested action (`start` or `stop`).
		action: &'static str,
		/// State reported by the charge point.
		state: String,
		/// State the action requires.
		expected: &'static str,
	},
	/// Stop was requested but the charge point reported no charges.
	#[error("Charge point {charge_point_id} has no charge to stop.")]
	NoActiveCharge {
		/// Charge point identifier.
		charge_point_id: i64,
	},
}
impl Error {
	/// Wraps an unexpected failure while preserving its source.
	pub fn unexpected(
		message: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Unexpected { message: message.into(), source: Box::new(src) }
	}

	/// Returns `true` when the host should route the failure to its re-authentication path.
	pub fn is_authentication(&self) -> bool {
		matches!(self, Self::Authentication { .. })
	}

	/// Returns `true` for failures that are expected to clear on a later attempt.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Communication(_) | Self::RateLimit(_))
	}

	/// Server- or gate-provided wait before the next attempt, if any.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::RateLimit(e) => Some(e.retry_after),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL `{url}` is invalid.")]
	InvalidBaseUrl {
		/// Offending value.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL does not use HTTPS and is not a loopback address.
	#[error("Base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Offending value.
		url: String,
	},
	/// Base URL cannot have relative endpoint paths joined onto it.
	#[error("Base URL cannot be used as a base for endpoint paths: {url}.")]
	BaseUrlNotJoinable {
		/// Offending value.
		url: String,
	},
	/// Endpoint path cannot be joined onto the base URL.
	#[error("Endpoint path `{path}` is invalid.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transient failures reaching the API.
#[derive(Debug, ThisError)]
pub enum CommunicationError {
	/// The request did not complete within the configured timeout.
	#[error("Request to `{path}` timed out after {timeout}.")]
	Timeout {
		/// Endpoint path.
		path: String,
		/// Timeout that elapsed.
		timeout: Duration,
	},
	/// DNS, connection, TLS, or I/O failure.
	#[error("Network error occurred while calling `{path}`.")]
	Network {
		/// Endpoint path.
		path: String,
		/// Transport-specific failure.
		#[source]
		source: TransportError,
	},
	/// Non-2xx status other than 401, 403, and 429.
	#[error("Monta API returned HTTP {status} for `{path}`.")]
	Status {
		/// Endpoint path.
		path: String,
		/// HTTP status code.
		status: u16,
	},
}

/// HTTP 429 outcome handed back to the caller once local retries are exhausted.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Monta API rate limit reached; retry after {retry_after}.")]
pub struct RateLimitError {
	/// Wait before the next attempt.
	pub retry_after: Duration,
	/// Instant the server quota resets, when it could be resolved.
	pub reset_at: Option<OffsetDateTime>,
	/// Remaining request quota reported by the server.
	pub remaining: Option<u64>,
}

/// Transport-level failures (network, IO) reported by an [`HttpTransport`](crate::http::HttpTransport).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rate_limit_errors_expose_retry_hints() {
		let err = Error::from(RateLimitError {
			retry_after: Duration::seconds(42),
			reset_at: None,
			remaining: Some(0),
		});

		assert!(err.is_transient());
		assert!(!err.is_authentication());
		assert_eq!(err.retry_after(), Some(Duration::seconds(42)));
	}

	#[test]
	fn communication_errors_keep_their_source() {
		let err = Error::from(CommunicationError::Network {
			path: "charge-points".into(),
			source: TransportError::network(std::io::Error::other("connection refused")),
		});
		let source = StdError::source(&err)
			.expect("Communication errors should expose the transport failure as their source.");

		assert!(err.is_transient());
		assert!(err.retry_after().is_none());
		assert!(source.to_string().contains("Network error"));
	}

	#[test]
	fn invalid_state_message_names_both_states() {
		let err = Error::InvalidState { action: "start", state: "busy".into(), expected: "available" };

		assert_eq!(
			err.to_string(),
			"Cannot start charging: charger is in state `busy`, expected `available`."
		);
	}
}
