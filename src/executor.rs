//! Single-call HTTP execution: header merging, timeout, status interpretation, rate-limit gating,
//! and redacted logging.

pub mod rate_limit;
pub mod redact;

pub use rate_limit::*;
pub use redact::*;

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::{CommunicationError, ConfigError, RateLimitError},
	http::{ApiRequest, ApiResponse, HttpTransport, Method},
};

const DEFAULT_HEADERS: [(&str, &str); 2] =
	[("Content-Type", "application/json; charset=UTF-8"), ("Accept", "application/json")];

/// Executes API calls against one base URL over a shared [`HttpTransport`].
pub struct RequestExecutor<C>
where
	C: ?Sized + HttpTransport,
{
	transport: Arc<C>,
	base_url: Url,
	config: ClientConfig,
	gate: RateLimitGate,
}
impl<C> RequestExecutor<C>
where
	C: ?Sized + HttpTransport,
{
	/// Validates `config` and binds it to `transport`.
	pub fn new(transport: Arc<C>, config: ClientConfig) -> Result<Self> {
		let base_url = config.validated_base_url()?;

		Ok(Self { transport, base_url, config, gate: RateLimitGate::default() })
	}

	/// Validated base URL.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Configuration the executor was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Rate-limit gate shared by every call of this executor.
	pub fn gate(&self) -> &RateLimitGate {
		&self.gate
	}

	/// Underlying transport.
	pub fn transport(&self) -> &Arc<C> {
		&self.transport
	}

	/// Performs one logical API call and returns the decoded JSON body (`null` when empty).
	///
	/// `headers` override the JSON defaults case-insensitively. A 429 whose reset falls within the
	/// short-retry threshold is retried in place after sleeping through the reset plus jitter, up
	/// to the configured number of retries.
	pub async fn execute(
		&self,
		method: Method,
		path: &str,
		headers: &[(&str, &str)],
		body: Option<&Value>,
	) -> Result<Value> {
		if let Some(e) = self.gate.check(OffsetDateTime::now_utc()) {
			tracing::warn!(
				%method,
				path,
				retry_after = %e.retry_after,
				"Rate-limit gate is closed; skipping request."
			);

			return Err(e.into());
		}

		let request = self.build_request(method, path, headers, body)?;
		let limits = &self.config.rate_limit;
		let mut retries_left = limits.short_retry_attempts;

		loop {
			let response = self.send_once(path, request.clone()).await?;

			log_response(method, path, &response);

			match response.status {
				200..=299 => {
					self.gate.clear();

					return decode(path, &response.body);
				},
				401 | 403 =>
					return Err(Error::Authentication {
						reason: format!("HTTP {} from `{path}`", response.status),
					}),
				429 => {},
				status => return Err(CommunicationError::Status { path: path.into(), status }.into()),
			}

			let now = OffsetDateTime::now_utc();
			let signal = RateLimitSignal::from_response(&response, now);
			let (Some(resets_in), Some(reset_at)) = (signal.resets_in, signal.reset_at(now)) else {
				tracing::warn!(
					path,
					fallback = %limits.fallback_retry_after,
					"Rate limited without a reset hint."
				);

				return Err(RateLimitError {
					retry_after: limits.fallback_retry_after,
					reset_at: None,
					remaining: signal.remaining,
				}
				.into());
			};

			self.gate.block_until(reset_at);

			if retries_left == 0 || resets_in > limits.short_retry_threshold {
				tracing::warn!(
					path,
					retry_after = %resets_in,
					remaining = ?signal.remaining,
					"Rate limited; deferring to the caller."
				);

				return Err(RateLimitError {
					retry_after: resets_in,
					reset_at: Some(reset_at),
					remaining: signal.remaining,
				}
				.into());
			}

			retries_left -= 1;

			let wait = resets_in + jitter(limits.max_jitter);

			tracing::warn!(path, %wait, retries_left, "Rate limited; retrying after a short wait.");
			tokio::time::sleep(to_std(wait)).await;
		}
	}

	/// Like [`execute`](Self::execute) but decodes the body into `T`.
	pub async fn execute_as<T>(
		&self,
		method: Method,
		path: &str,
		headers: &[(&str, &str)],
		body: Option<&Value>,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let value = self.execute(method, path, headers, body).await?;

		serde_path_to_error::deserialize(value)
			.map_err(|source| Error::ResponseParse { path: path.into(), source })
	}

	fn build_request(
		&self,
		method: Method,
		path: &str,
		headers: &[(&str, &str)],
		body: Option<&Value>,
	) -> Result<ApiRequest> {
		let url = self
			.base_url
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidPath { path: path.into(), source })?;
		let mut merged = DEFAULT_HEADERS
			.iter()
			.map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
			.collect::<Vec<_>>();

		for (name, value) in headers {
			match merged.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(name)) {
				Some(slot) => *slot = ((*name).to_owned(), (*value).to_owned()),
				None => merged.push(((*name).to_owned(), (*value).to_owned())),
			}
		}

		let body = body
			.map(serde_json::to_vec)
			.transpose()
			.map_err(|e| Error::unexpected("Request body could not be serialized", e))?;

		Ok(ApiRequest { method, url, headers: merged, body })
	}

	async fn send_once(&self, path: &str, request: ApiRequest) -> Result<ApiResponse> {
		let timeout = self.config.request_timeout;

		tracing::debug!(method = %request.method, url = %request.url, "Sending request.");

		match tokio::time::timeout(to_std(timeout), self.transport.send(request)).await {
			Ok(Ok(response)) => Ok(response),
			Ok(Err(source)) => {
				tracing::warn!(path, error = %source, "Transport failure.");

				Err(CommunicationError::Network { path: path.into(), source }.into())
			},
			Err(_) => {
				tracing::warn!(path, %timeout, "Request timed out.");

				Err(CommunicationError::Timeout { path: path.into(), timeout }.into())
			},
		}
	}
}
impl<C> Debug for RequestExecutor<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestExecutor")
			.field("base_url", &self.base_url.as_str())
			.field("config", &self.config)
			.field("gate", &self.gate)
			.finish()
	}
}

fn decode(path: &str, body: &[u8]) -> Result<Value> {
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(Value::Null);
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::ResponseParse { path: path.into(), source })
}

fn log_response(method: Method, path: &str, response: &ApiResponse) {
	match serde_json::from_slice::<Value>(&response.body) {
		Ok(body) => tracing::debug!(
			%method,
			path,
			status = response.status,
			headers = ?response.headers,
			body = %redact(&body),
			"Received response."
		),
		Err(_) => tracing::debug!(
			%method,
			path,
			status = response.status,
			headers = ?response.headers,
			body_len = response.body.len(),
			"Received non-JSON response."
		),
	}
}

fn jitter(max: Duration) -> Duration {
	let max_ms = max.whole_milliseconds().clamp(0, i64::MAX as i128) as i64;

	if max_ms == 0 {
		return Duration::ZERO;
	}

	Duration::milliseconds(rand::rng().random_range(0..=max_ms))
}

pub(crate) fn to_std(duration: Duration) -> std::time::Duration {
	duration.try_into().unwrap_or_default()
}
