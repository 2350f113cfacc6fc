//! Demonstrates one host polling cycle against a mock API: authenticate, list charge points with
//! their charges, and derive the next poll interval from the outcome.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
// self
use monta_client::{
	ClientConfig, Credentials, MontaClient,
	poll::PollBackoff,
	reqwest::Client,
	store::{MemoryTokenStorage, TokenStorage},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let now = OffsetDateTime::now_utc();
	let access_expiry = (now + Duration::hours(1)).format(&Rfc3339)?;
	let refresh_expiry = (now + Duration::days(30)).format(&Rfc3339)?;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/token");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"accessToken": "demo-access",
				"accessTokenExpirationDate": access_expiry,
				"refreshToken": "demo-refresh",
				"refreshTokenExpirationDate": refresh_expiry,
			}));
		})
		.await;
	let _charge_points = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/charge-points");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"data": [
					{ "id": 7, "name": "Driveway", "serialNumber": "SN-7", "state": "busy-charging" },
				],
			}));
		})
		.await;
	let _charges = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/charges").query_param("chargePointId", "7");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"data": [{ "id": 900, "state": "completed" }, { "id": 901, "state": "charging" }],
			}));
		})
		.await;
	let storage: Arc<dyn TokenStorage> = Arc::new(MemoryTokenStorage::default());
	// The mock server presents a self-signed certificate.
	let http_client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()?;
	let client = MontaClient::with_http_client(
		Credentials::new("demo-client", "super-secret"),
		storage,
		http_client,
		ClientConfig::default().with_base_url(server.url("/api/v1/")),
	)?;
	let mut backoff = PollBackoff::new(PollBackoff::CHARGE_POINTS);
	let result = client.charge_points_with_charges().await;
	let next = backoff.observe(&result);

	for (id, charge_point) in result? {
		println!(
			"Charge point {id} ({}) is {}; latest charge: {:?}.",
			charge_point.name,
			charge_point.state,
			charge_point.latest_charge().map(|charge| (charge.id, &charge.state)),
		);
	}

	println!("Next poll in {next}.");

	token_mock.assert_async().await;

	Ok(())
}
