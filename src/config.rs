//! Client configuration: API base URL, timeouts, the preemptive refresh window, and rate-limit
//! retry tuning.
//!
//! Every field has a default matching the production API, so hosts usually only override what
//! they need. Durations deserialize from (fractional) seconds:
//!
//! ```
//! let config: monta_client::ClientConfig =
//! 	serde_json::from_str(r#"{ "request_timeout": 5, "rate_limit": { "max_jitter": 0.25 } }"#)
//! 		.unwrap();
//!
//! assert_eq!(config.request_timeout, time::Duration::seconds(5));
//! assert_eq!(config.rate_limit.short_retry_attempts, 2);
//! ```

// self
use crate::{_prelude::*, error::ConfigError};

/// Production API base path.
pub const DEFAULT_BASE_URL: &str = "https://public-api.monta.com/api/v1/";

/// Settings shared by the executor and the token manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	/// Base URL every endpoint path is joined onto.
	pub base_url: String,
	/// Upper bound for a single HTTP exchange.
	#[serde(with = "seconds")]
	pub request_timeout: Duration,
	/// Tokens with less than this much lifetime left are treated as unusable.
	#[serde(with = "seconds")]
	pub preemptive_refresh_window: Duration,
	/// HTTP 429 handling.
	pub rate_limit: RateLimitConfig,
}
impl ClientConfig {
	const DEFAULT_PREEMPTIVE_REFRESH_WINDOW: Duration = Duration::seconds(300);
	const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(10);

	/// Overrides the base URL (defaults to [`DEFAULT_BASE_URL`]).
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();

		self
	}

	/// Overrides the request timeout (defaults to 10 seconds).
	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the preemptive refresh window (defaults to 300 seconds).
	pub fn with_preemptive_refresh_window(mut self, window: Duration) -> Self {
		self.preemptive_refresh_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Replaces the rate-limit settings.
	pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
		self.rate_limit = rate_limit;

		self
	}

	/// Checks the configuration without building a client.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.validated_base_url().map(|_| ())
	}

	/// Parses and validates the base URL.
	///
	/// HTTPS is required except for loopback hosts, which keeps local mock servers usable. A
	/// missing trailing slash is added so relative endpoint paths join beneath the base path.
	pub fn validated_base_url(&self) -> Result<Url, ConfigError> {
		let mut raw = self.base_url.trim().to_owned();

		if !raw.ends_with('/') {
			raw.push('/');
		}

		let url = Url::parse(&raw)
			.map_err(|source| ConfigError::InvalidBaseUrl { url: self.base_url.clone(), source })?;

		if url.cannot_be_a_base() {
			return Err(ConfigError::BaseUrlNotJoinable { url: url.into() });
		}
		if url.scheme() != "https" && !(url.scheme() == "http" && is_loopback(&url)) {
			return Err(ConfigError::InsecureBaseUrl { url: url.into() });
		}

		Ok(url)
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.into(),
			request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
			preemptive_refresh_window: Self::DEFAULT_PREEMPTIVE_REFRESH_WINDOW,
			rate_limit: RateLimitConfig::default(),
		}
	}
}

/// Tuning for in-client HTTP 429 handling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
	/// Resets at or below this wait are retried in place.
	#[serde(with = "seconds")]
	pub short_retry_threshold: Duration,
	/// In-place retries allowed per request.
	pub short_retry_attempts: u32,
	/// Upper bound of the random delay added to each in-place retry.
	#[serde(with = "seconds")]
	pub max_jitter: Duration,
	/// Wait reported to the caller when a 429 carries no reset hint.
	#[serde(with = "seconds")]
	pub fallback_retry_after: Duration,
}
impl RateLimitConfig {
	/// Disables in-place retries; every 429 surfaces to the caller.
	pub fn without_retries(mut self) -> Self {
		self.short_retry_attempts = 0;

		self
	}

	/// Overrides the jitter bound.
	pub fn with_max_jitter(mut self, jitter: Duration) -> Self {
		self.max_jitter = if jitter.is_negative() { Duration::ZERO } else { jitter };

		self
	}
}
impl Default for RateLimitConfig {
	fn default() -> Self {
		Self {
			short_retry_threshold: Duration::seconds(2),
			short_retry_attempts: 2,
			max_jitter: Duration::milliseconds(500),
			fallback_retry_after: Duration::seconds(60),
		}
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

mod seconds {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
	use time::Duration;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_f64(value.as_seconds_f64())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let secs = f64::deserialize(deserializer)?;

		if !secs.is_finite() || secs < 0. {
			return Err(D::Error::custom("durations must be a non-negative number of seconds"));
		}

		Ok(Duration::seconds_f64(secs))
	}
}
