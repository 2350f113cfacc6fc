//! Access-token lifecycle: load, reuse, refresh, or re-authenticate under one lock.
//!
//! [`TokenManager::get_access_token`] is the single entry point data calls go through. It takes
//! the per-client async lock, loads the persisted [`TokenState`] on first use, and performs the
//! cheapest operation able to hand out a token with more than the preemptive window left:
//! reuse the cached access token, exchange the refresh token, or authenticate with the client
//! credentials. Holding the lock across the network call means concurrent callers that all find
//! a stale token produce exactly one round trip; the others wake up to the fresh state.

mod metrics;

pub use metrics::TokenMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Credentials, Secret, TokenAction, TokenState},
	executor::RequestExecutor,
	http::{HttpTransport, Method},
	model::TokenResponse,
	obs::{self, OpKind},
	store::TokenStorage,
};

const TOKEN_PATH: &str = "auth/token";
const REFRESH_PATH: &str = "auth/refresh";

/// Owns the token pair of one client instance.
pub struct TokenManager<C>
where
	C: ?Sized + HttpTransport,
{
	executor: Arc<RequestExecutor<C>>,
	credentials: Credentials,
	storage: Arc<dyn TokenStorage>,
	preemptive_window: Duration,
	state: AsyncMutex<Option<TokenState>>,
	metrics: TokenMetrics,
}
impl<C> TokenManager<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a manager; the stored state is loaded lazily on first use.
	pub fn new(
		executor: Arc<RequestExecutor<C>>,
		credentials: Credentials,
		storage: Arc<dyn TokenStorage>,
	) -> Self {
		let preemptive_window = executor.config().preemptive_refresh_window;

		Self {
			executor,
			credentials,
			storage,
			preemptive_window,
			state: AsyncMutex::new(None),
			metrics: TokenMetrics::default(),
		}
	}

	/// Counters describing how tokens were obtained.
	pub fn metrics(&self) -> &TokenMetrics {
		&self.metrics
	}

	/// Window below which a token counts as unusable.
	pub fn preemptive_window(&self) -> Duration {
		self.preemptive_window
	}

	/// Calls the token endpoint with the client credentials without touching the stored state.
	pub async fn request_token(&self) -> Result<TokenResponse> {
		obs::observe(OpKind::Authenticate, "request_token", async {
			self.executor
				.execute_as(
					Method::Post,
					TOKEN_PATH,
					&[],
					Some(&self.credentials.token_request_body()),
				)
				.await
		})
		.await
	}

	/// Authenticates with the client credentials, persists the new pair, and returns the access
	/// token.
	pub async fn authenticate(&self) -> Result<Secret> {
		let mut guard = self.state.lock().await;
		let state = self.loaded(&mut guard).await?;

		self.authenticate_locked(state).await
	}

	/// Returns an access token with more than the preemptive window of lifetime left, performing
	/// at most one network call.
	pub async fn get_access_token(&self) -> Result<Secret> {
		obs::observe(OpKind::GetAccessToken, "get_access_token", async {
			let mut guard = self.state.lock().await;
			let state = self.loaded(&mut guard).await?;

			match state.next_action(OffsetDateTime::now_utc(), self.preemptive_window) {
				TokenAction::Reuse(access) => {
					self.metrics.record_cache_hit();

					Ok(access)
				},
				TokenAction::Refresh(refresh) => match self.refresh_locked(state, &refresh).await {
					Err(e) if e.is_authentication() => {
						tracing::warn!(
							error = %e,
							"Refresh token was rejected; falling back to client credentials."
						);

						state.refresh = None;

						self.authenticate_locked(state).await
					},
					result => result,
				},
				TokenAction::Authenticate => self.authenticate_locked(state).await,
			}
		})
		.await
	}

	/// Drops the cached access token (the refresh token is kept) so the next
	/// [`get_access_token`](Self::get_access_token) refreshes.
	pub async fn invalidate(&self) -> Result<()> {
		let mut guard = self.state.lock().await;
		let state = self.loaded(&mut guard).await?;

		if state.access.take().is_some() {
			tracing::info!("Cached access token invalidated.");
			self.storage.save(state).await?;
		}

		Ok(())
	}

	/// Drops the cached access token only while it is still `rejected`.
	///
	/// A concurrent caller may already have replaced the token the server turned down; that newer
	/// token stays. Returns whether anything was dropped.
	pub async fn invalidate_rejected(&self, rejected: &Secret) -> Result<bool> {
		let mut guard = self.state.lock().await;
		let state = self.loaded(&mut guard).await?;

		if state.access.as_ref().is_none_or(|access| &access.secret != rejected) {
			tracing::debug!("Rejected access token was already replaced.");

			return Ok(false);
		}

		state.access = None;

		tracing::info!("Rejected access token invalidated.");
		self.storage.save(state).await?;

		Ok(true)
	}

	/// Snapshot of the current token state, loading it from storage if needed.
	pub async fn state(&self) -> Result<TokenState> {
		let mut guard = self.state.lock().await;

		Ok(self.loaded(&mut guard).await?.clone())
	}

	async fn loaded<'a>(&self, slot: &'a mut Option<TokenState>) -> Result<&'a mut TokenState> {
		if slot.is_none() {
			let stored = self.storage.load().await?;

			tracing::debug!(found = stored.is_some(), "Loaded token state from storage.");

			*slot = Some(stored.unwrap_or_default());
		}

		Ok(slot.get_or_insert_with(TokenState::default))
	}

	async fn authenticate_locked(&self, state: &mut TokenState) -> Result<Secret> {
		let response = match self.request_token().await {
			Ok(response) => response,
			Err(e) => {
				self.metrics.record_failure();

				return Err(e);
			},
		};

		self.metrics.record_authentication();
		tracing::info!("Authenticated with client credentials.");

		self.commit(state, &response).await
	}

	async fn refresh_locked(&self, state: &mut TokenState, refresh: &Secret) -> Result<Secret> {
		let body = serde_json::json!({ "refreshToken": refresh.expose() });
		let result = obs::observe(OpKind::Refresh, "refresh_token", async {
			self.executor
				.execute_as::<TokenResponse>(Method::Post, REFRESH_PATH, &[], Some(&body))
				.await
		})
		.await;
		let response = match result {
			Ok(response) => response,
			Err(e) => {
				self.metrics.record_failure();

				return Err(e);
			},
		};

		self.metrics.record_refresh();
		tracing::info!("Refreshed access token.");

		self.commit(state, &response).await
	}

	async fn commit(&self, state: &mut TokenState, response: &TokenResponse) -> Result<Secret> {
		state.apply(response);

		let now = OffsetDateTime::now_utc();
		let degenerate =
			state.access.as_ref().filter(|token| !token.is_usable_at(now, self.preemptive_window));

		if let Some(access) = degenerate {
			tracing::warn!(
				remaining = %access.remaining_at(now),
				window = %self.preemptive_window,
				"Freshly issued access token is already inside the preemptive refresh window."
			);
		}

		self.storage.save(state).await?;

		Ok(response.access_token.clone())
	}
}
impl<C> Debug for TokenManager<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("credentials", &self.credentials)
			.field("preemptive_window", &self.preemptive_window)
			.field("metrics", &self.metrics)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration as StdDuration;
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		_preludet::{ScriptedTransport, token_payload},
		auth::IssuedToken,
		config::ClientConfig,
		error::CommunicationError,
		store::{MemoryTokenStorage, StoreError, StoreFuture},
	};

	fn manager(
		config: ClientConfig,
		storage: MemoryTokenStorage,
	) -> (TokenManager<ScriptedTransport>, Arc<ScriptedTransport>, MemoryTokenStorage) {
		let transport = Arc::new(ScriptedTransport::default());
		let executor = RequestExecutor::new(transport.clone(), config)
			.expect("Executor configuration should be valid.");
		let manager = TokenManager::new(
			Arc::new(executor),
			Credentials::new("client-id", "client-secret"),
			Arc::new(storage.clone()),
		);

		(manager, transport, storage)
	}

	fn seeded(access_in: Option<i64>, refresh_in: Option<i64>) -> MemoryTokenStorage {
		let now = OffsetDateTime::now_utc();

		MemoryTokenStorage::seeded(TokenState {
			access: access_in.map(|s| IssuedToken::new("A0", now + Duration::seconds(s))),
			refresh: refresh_in.map(|s| IssuedToken::new("R0", now + Duration::seconds(s))),
			metadata: Map::new(),
		})
	}

	#[tokio::test]
	async fn fresh_access_token_needs_no_network() {
		let (manager, transport, _) = manager(ClientConfig::default(), seeded(Some(3_600), None));
		let token = manager.get_access_token().await.expect("Cached token should be returned.");

		assert_eq!(token.expose(), "A0");
		assert_eq!(transport.request_count(), 0);
		assert_eq!(manager.metrics().cache_hits(), 1);
	}

	#[tokio::test]
	async fn stale_access_token_is_refreshed_once() {
		let (manager, transport, storage) =
			manager(ClientConfig::default(), seeded(Some(10), Some(86_400)));

		transport.push_json(
			200,
			token_payload("A1", Duration::hours(1), "R1", Duration::days(30)),
		);

		let token = manager.get_access_token().await.expect("Refresh should succeed.");
		let requests = transport.requests();

		assert_eq!(token.expose(), "A1");
		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].url.path(), "/api/v1/auth/refresh");
		assert_eq!(requests[0].json_body(), Some(json!({ "refreshToken": "R0" })));

		let saved = storage.snapshot().expect("Refreshed state should be persisted.");

		assert_eq!(saved.access.map(|t| t.secret), Some(Secret::new("A1")));
		assert_eq!(saved.refresh.map(|t| t.secret), Some(Secret::new("R1")));
		assert_eq!(manager.metrics().refreshes(), 1);
	}

	#[tokio::test]
	async fn missing_tokens_trigger_one_authentication() {
		let (manager, transport, storage) = manager(ClientConfig::default(), seeded(None, None));

		transport.push_json(
			200,
			token_payload("A1", Duration::hours(1), "R1", Duration::days(30)),
		);

		let token = manager.get_access_token().await.expect("Authentication should succeed.");
		let requests = transport.requests();

		assert_eq!(token.expose(), "A1");
		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].url.path(), "/api/v1/auth/token");
		assert_eq!(
			requests[0].json_body(),
			Some(json!({ "clientId": "client-id", "clientSecret": "client-secret" }))
		);
		assert!(storage.snapshot().and_then(|s| s.refresh).is_some());
		assert_eq!(manager.metrics().authentications(), 1);
	}

	#[tokio::test]
	async fn expired_refresh_token_falls_through_to_authentication() {
		let (manager, transport, _) = manager(ClientConfig::default(), seeded(Some(-60), Some(60)));

		transport.push_json(
			200,
			token_payload("A1", Duration::hours(1), "R1", Duration::days(30)),
		);
		manager.get_access_token().await.expect("Authentication should succeed.");

		assert_eq!(transport.requests()[0].url.path(), "/api/v1/auth/token");
	}

	#[tokio::test(start_paused = true)]
	async fn concurrent_callers_share_one_authentication() {
		let (manager, transport, _) = manager(ClientConfig::default(), seeded(None, None));
		let manager = Arc::new(manager);

		transport.push_delayed(
			StdDuration::from_millis(200),
			200,
			token_payload("A1", Duration::hours(1), "R1", Duration::days(30)),
		);

		let handles = (0..8)
			.map(|_| {
				let manager = manager.clone();

				tokio::spawn(async move { manager.get_access_token().await })
			})
			.collect::<Vec<_>>();

		for handle in handles {
			let token = handle
				.await
				.expect("Task should not panic.")
				.expect("Every caller should receive a token.");

			assert_eq!(token.expose(), "A1");
		}

		assert_eq!(transport.request_count(), 1);
		assert_eq!(manager.metrics().authentications(), 1);
		assert_eq!(manager.metrics().cache_hits(), 7);
	}

	#[tokio::test]
	async fn rejected_refresh_falls_back_to_credentials() {
		let (manager, transport, storage) =
			manager(ClientConfig::default(), seeded(Some(10), Some(86_400)));

		transport
			.push_json(401, json!({ "message": "refresh token revoked" }))
			.push_json(200, token_payload("A2", Duration::hours(1), "R2", Duration::days(30)));

		let token = manager.get_access_token().await.expect("Fallback should authenticate.");
		let paths = transport.requests().iter().map(|r| r.url.path().to_owned()).collect::<Vec<_>>();

		assert_eq!(token.expose(), "A2");
		assert_eq!(paths, ["/api/v1/auth/refresh", "/api/v1/auth/token"]);
		assert_eq!(
			storage.snapshot().and_then(|s| s.refresh).map(|t| t.secret),
			Some(Secret::new("R2"))
		);
	}

	#[tokio::test]
	async fn rejected_credentials_surface_as_authentication_errors() {
		let (manager, transport, storage) = manager(ClientConfig::default(), seeded(None, None));

		transport.push_json(401, json!({ "message": "invalid client" }));

		let err = manager.get_access_token().await.expect_err("Bad credentials should fail.");

		assert!(err.is_authentication());
		assert_eq!(manager.metrics().failures(), 1);
		assert_eq!(storage.snapshot().and_then(|s| s.access), None);
	}

	#[tokio::test(start_paused = true)]
	async fn timed_out_refresh_leaves_state_untouched() {
		let storage = seeded(Some(10), Some(86_400));
		let before = storage.snapshot();
		let (manager, transport, storage) = manager(ClientConfig::default(), storage);

		transport.push_delayed(
			StdDuration::from_secs(30),
			200,
			token_payload("A1", Duration::hours(1), "R1", Duration::days(30)),
		);

		let err = manager.get_access_token().await.expect_err("Refresh should time out.");

		assert!(matches!(err, Error::Communication(CommunicationError::Timeout { .. })));
		assert_eq!(storage.snapshot(), before);
		assert_eq!(manager.state().await.expect("State should be readable."), before.unwrap_or_default());
	}

	#[tokio::test]
	async fn window_wider_than_lifetime_returns_fresh_token_without_looping() {
		let (manager, transport, _) = manager(
			ClientConfig::default().with_preemptive_refresh_window(Duration::hours(2)),
			seeded(None, None),
		);

		transport
			.push_json(200, token_payload("A1", Duration::hours(1), "R1", Duration::days(30)))
			.push_json(200, token_payload("A2", Duration::hours(1), "R2", Duration::days(30)));

		let first = manager.get_access_token().await.expect("Authentication should succeed.");
		let second = manager.get_access_token().await.expect("Refresh should succeed.");
		let paths = transport.requests().iter().map(|r| r.url.path().to_owned()).collect::<Vec<_>>();

		assert_eq!(first.expose(), "A1");
		assert_eq!(second.expose(), "A2");
		assert_eq!(paths, ["/api/v1/auth/token", "/api/v1/auth/refresh"]);
	}

	#[tokio::test]
	async fn invalidate_forces_a_refresh() {
		let (manager, transport, storage) =
			manager(ClientConfig::default(), seeded(Some(3_600), Some(86_400)));

		manager.invalidate().await.expect("Invalidation should persist.");

		assert!(storage.snapshot().and_then(|s| s.access).is_none());

		transport.push_json(200, token_payload("A1", Duration::hours(1), "R1", Duration::days(30)));
		manager.get_access_token().await.expect("Refresh should succeed.");

		assert_eq!(transport.requests()[0].url.path(), "/api/v1/auth/refresh");
	}

	#[tokio::test]
	async fn invalidate_rejected_keeps_a_newer_token() {
		let (manager, transport, storage) =
			manager(ClientConfig::default(), seeded(Some(3_600), Some(86_400)));

		let dropped = manager
			.invalidate_rejected(&Secret::new("stale-elsewhere"))
			.await
			.expect("Comparison should not fail.");

		assert!(!dropped);
		assert_eq!(
			storage.snapshot().and_then(|s| s.access).map(|t| t.secret),
			Some(Secret::new("A0"))
		);

		let dropped = manager
			.invalidate_rejected(&Secret::new("A0"))
			.await
			.expect("Invalidation should persist.");

		assert!(dropped);
		assert!(storage.snapshot().and_then(|s| s.access).is_none());
		assert_eq!(transport.request_count(), 0);
	}

	#[tokio::test]
	async fn request_token_does_not_mutate_state() {
		let (manager, transport, storage) = manager(ClientConfig::default(), seeded(None, None));

		transport.push_json(200, token_payload("A1", Duration::hours(1), "R1", Duration::days(30)));

		let response = manager.request_token().await.expect("Token request should succeed.");

		assert_eq!(response.access_token.expose(), "A1");
		assert_eq!(storage.snapshot(), Some(TokenState::default()));
		assert_eq!(manager.state().await.expect("State should load."), TokenState::default());
	}

	#[derive(Debug, Default)]
	struct BrokenStorage;
	impl TokenStorage for BrokenStorage {
		fn load(&self) -> StoreFuture<'_, Option<TokenState>> {
			Box::pin(async { Ok(None) })
		}

		fn save<'a>(&'a self, _: &'a TokenState) -> StoreFuture<'a, ()> {
			Box::pin(async { Err(StoreError::Backend { message: "read-only".into() }) })
		}
	}

	#[tokio::test]
	async fn save_failures_propagate_but_keep_the_new_tokens_in_memory() {
		let transport = Arc::new(ScriptedTransport::default());
		let executor = RequestExecutor::new(transport.clone(), ClientConfig::default())
			.expect("Executor configuration should be valid.");
		let manager = TokenManager::new(
			Arc::new(executor),
			Credentials::new("client-id", "client-secret"),
			Arc::new(BrokenStorage),
		);

		transport.push_json(200, token_payload("A1", Duration::hours(1), "R1", Duration::days(30)));

		let err = manager.get_access_token().await.expect_err("Save failures should surface.");

		assert!(matches!(err, Error::Storage(StoreError::Backend { .. })));

		let token = manager.get_access_token().await.expect("In-memory tokens should be reused.");

		assert_eq!(token.expose(), "A1");
		assert_eq!(transport.request_count(), 1);
	}
}
