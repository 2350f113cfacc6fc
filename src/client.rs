//! Client façade: every domain operation obtains a token, calls the executor, and parses a typed
//! model.

// self
use crate::{
	_prelude::*,
	auth::Credentials,
	config::ClientConfig,
	executor::RequestExecutor,
	http::{HttpTransport, Method},
	model::{Charge, ChargePoint, ListEnvelope, Wallet, WalletTransaction, newest_first},
	obs::{self, OpKind},
	store::TokenStorage,
	token::TokenManager,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

const CHARGE_POINTS_PATH: &str = "charge-points?page=0&perPage=10";
const CHARGES_PATH: &str = "charges";
const WALLET_PATH: &str = "wallets/personal";
const WALLET_TRANSACTIONS_PATH: &str = "wallet-transactions";

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestMontaClient = MontaClient<ReqwestTransport>;

/// Monta public API client.
///
/// Cheap to clone; clones share the transport, the token lock, and the rate-limit gate, so one
/// instance can serve every poller and on-demand action of a host.
pub struct MontaClient<C>
where
	C: ?Sized + HttpTransport,
{
	executor: Arc<RequestExecutor<C>>,
	tokens: Arc<TokenManager<C>>,
}
impl<C> MontaClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client over a caller-provided transport.
	pub fn with_transport(
		credentials: Credentials,
		storage: Arc<dyn TokenStorage>,
		transport: impl Into<Arc<C>>,
		config: ClientConfig,
	) -> Result<Self> {
		let executor = Arc::new(RequestExecutor::new(transport.into(), config)?);
		let tokens = Arc::new(TokenManager::new(executor.clone(), credentials, storage));

		Ok(Self { executor, tokens })
	}

	/// Token manager backing this client.
	pub fn tokens(&self) -> &TokenManager<C> {
		&self.tokens
	}

	/// Executor backing this client, for endpoints without a typed wrapper.
	pub fn executor(&self) -> &RequestExecutor<C> {
		&self.executor
	}

	/// Instant the rate-limit gate lifts, when requests are currently blocked.
	pub fn rate_limited_until(&self) -> Option<OffsetDateTime> {
		self.executor.gate().blocked_until().filter(|until| *until > OffsetDateTime::now_utc())
	}

	/// Lists the account's physical charge points keyed by identifier.
	///
	/// Entries without a serial number are dropped, and charges are never included; use
	/// [`charge_points_with_charges`](Self::charge_points_with_charges) for that.
	pub async fn list_charge_points(&self) -> Result<BTreeMap<i64, ChargePoint>> {
		obs::observe(OpKind::ListChargePoints, "list_charge_points", async {
			let envelope = self
				.authorized::<ListEnvelope<ChargePoint>>(Method::Get, CHARGE_POINTS_PATH, None)
				.await?;

			Ok(unwrap_listing(envelope, "charge points")
				.into_iter()
				.filter(ChargePoint::is_physical)
				.map(|charge_point| (charge_point.id, charge_point))
				.collect())
		})
		.await
	}

	/// Lists the charges of one charge point, most recent first.
	pub async fn list_charges(&self, charge_point_id: i64) -> Result<Vec<Charge>> {
		obs::observe(OpKind::ListCharges, "list_charges", async {
			let path = format!("{CHARGES_PATH}?chargePointId={charge_point_id}");
			let envelope =
				self.authorized::<ListEnvelope<Charge>>(Method::Get, &path, None).await?;
			let mut charges = unwrap_listing(envelope, "charges");

			newest_first(&mut charges, |charge| charge.id);

			Ok(charges)
		})
		.await
	}

	/// Starts a charge on `charge_point_id` and returns the raw API response.
	pub async fn start_charge(&self, charge_point_id: i64) -> Result<Value> {
		obs::observe(OpKind::StartCharge, "start_charge", async {
			let body = serde_json::json!({ "chargePointId": charge_point_id });
			let response = self.authorized(Method::Post, CHARGES_PATH, Some(&body)).await?;

			tracing::info!(charge_point_id, "Started a charge.");

			Ok(response)
		})
		.await
	}

	/// Stops charge `charge_id` and returns the raw API response.
	pub async fn stop_charge(&self, charge_id: i64) -> Result<Value> {
		obs::observe(OpKind::StopCharge, "stop_charge", async {
			let path = format!("{CHARGES_PATH}/{charge_id}/stop");
			let response = self.authorized(Method::Post, &path, None).await?;

			tracing::info!(charge_id, "Stopped a charge.");

			Ok(response)
		})
		.await
	}

	/// Fetches the personal wallet.
	pub async fn get_wallet(&self) -> Result<Wallet> {
		obs::observe(OpKind::GetWallet, "get_wallet", self.authorized(Method::Get, WALLET_PATH, None))
			.await
	}

	/// Lists the first page of wallet transactions, most recent first.
	pub async fn list_wallet_transactions(&self) -> Result<Vec<WalletTransaction>> {
		obs::observe(OpKind::ListWalletTransactions, "list_wallet_transactions", async {
			let envelope = self
				.authorized::<ListEnvelope<WalletTransaction>>(
					Method::Get,
					WALLET_TRANSACTIONS_PATH,
					None,
				)
				.await?;
			let mut transactions = unwrap_listing(envelope, "wallet transactions");

			newest_first(&mut transactions, |transaction| transaction.id);

			Ok(transactions)
		})
		.await
	}

	/// Lists charge points and attaches each one's charges, one call per charge point.
	pub async fn charge_points_with_charges(&self) -> Result<BTreeMap<i64, ChargePoint>> {
		let mut charge_points = self.list_charge_points().await?;

		for (id, charge_point) in charge_points.iter_mut() {
			charge_point.charges = self.list_charges(*id).await?;
		}

		Ok(charge_points)
	}

	/// Starts a charge after checking the charge point reports `available`.
	pub async fn start_charge_if_available(&self, charge_point: &ChargePoint) -> Result<Value> {
		charge_point.ensure_can_start()?;

		self.start_charge(charge_point.id).await
	}

	/// Stops the most recent charge of a `busy*` charge point.
	pub async fn stop_latest_charge(&self, charge_point: &ChargePoint) -> Result<Value> {
		charge_point.ensure_can_stop()?;

		let charges = self.list_charges(charge_point.id).await?;
		let latest = charges
			.first()
			.ok_or(Error::NoActiveCharge { charge_point_id: charge_point.id })?;

		self.stop_charge(latest.id).await
	}

	async fn authorized<T>(&self, method: Method, path: &str, body: Option<&Value>) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let access = self.tokens.get_access_token().await?;
		let bearer = access.bearer();
		let result =
			self.executor.execute_as(method, path, &[("Authorization", bearer.as_str())], body).await;

		if matches!(&result, Err(e) if e.is_authentication()) {
			// Only the token the server turned down; a concurrent refresh may have replaced it.
			if let Err(e) = self.tokens.invalidate_rejected(&access).await {
				tracing::warn!(error = %e, "Failed to invalidate the rejected access token.");
			}
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl MontaClient<ReqwestTransport> {
	/// Creates a client against the production API with a fresh reqwest connection pool.
	pub fn new(credentials: Credentials, storage: Arc<dyn TokenStorage>) -> Result<Self> {
		let client = ReqwestClient::builder().build().map_err(crate::error::ConfigError::from)?;

		Self::with_http_client(credentials, storage, client, ClientConfig::default())
	}

	/// Creates a client that shares the host's reqwest [`ReqwestClient`].
	pub fn with_http_client(
		credentials: Credentials,
		storage: Arc<dyn TokenStorage>,
		client: ReqwestClient,
		config: ClientConfig,
	) -> Result<Self> {
		Self::with_transport(credentials, storage, ReqwestTransport::with_client(client), config)
	}
}
impl<C> Clone for MontaClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { executor: self.executor.clone(), tokens: self.tokens.clone() }
	}
}
impl<C> Debug for MontaClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MontaClient")
			.field("base_url", &self.executor.base_url().as_str())
			.field("tokens", &self.tokens)
			.finish()
	}
}

fn unwrap_listing<T>(envelope: ListEnvelope<T>, what: &str) -> Vec<T> {
	envelope.data.unwrap_or_else(|| {
		tracing::warn!(what, "Listing response has no `data` field; treating it as empty.");

		Vec::new()
	})
}
