#![cfg(feature = "reqwest")]

mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use common::reqwest_test_client;
use monta_client::{
	ClientConfig, Credentials, Error, MontaClient, RateLimitConfig,
	auth::{IssuedToken, TokenState},
	client::ReqwestMontaClient,
	error::RateLimitError,
	poll::PollBackoff,
	store::MemoryTokenStorage,
};

fn build_client(server: &MockServer, rate_limit: RateLimitConfig) -> ReqwestMontaClient {
	let now = OffsetDateTime::now_utc();
	let storage = Arc::new(MemoryTokenStorage::seeded(TokenState {
		access: Some(IssuedToken::new("cached-access", now + Duration::hours(1))),
		refresh: Some(IssuedToken::new("cached-refresh", now + Duration::days(30))),
		..TokenState::default()
	}));

	MontaClient::with_http_client(
		Credentials::new("client-id", "client-secret"),
		storage,
		reqwest_test_client(),
		ClientConfig::default().with_base_url(server.url("/api/v1/")).with_rate_limit(rate_limit),
	)
	.expect("Client configuration should be valid for the mock server.")
}

#[tokio::test]
async fn long_resets_fail_fast_and_gate_later_calls() {
	let server = MockServer::start_async().await;
	let client = build_client(&server, RateLimitConfig::default());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/charge-points");
			then.status(429).header("content-type", "application/json").json_body(json!({
				"message": "Too many requests",
				"rateLimit": { "resetsIn": 45, "remaining": 0 },
			}));
		})
		.await;
	let err = client.list_charge_points().await.expect_err("A long reset should surface.");

	match &err {
		Error::RateLimit(RateLimitError { retry_after, reset_at, remaining }) => {
			assert_eq!(*retry_after, Duration::seconds(45));
			assert!(reset_at.is_some());
			assert_eq!(*remaining, Some(0));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(client.rate_limited_until().is_some());

	let gated = client.get_wallet().await.expect_err("The gate should block the next call.");

	assert!(gated.retry_after().is_some_and(|wait| wait <= Duration::seconds(45)));

	let mut backoff = PollBackoff::new(PollBackoff::CHARGE_POINTS);

	assert_eq!(backoff.on_error(&err), Duration::seconds(240));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn short_resets_are_retried_until_the_budget_runs_out() {
	let server = MockServer::start_async().await;
	let client = build_client(&server, RateLimitConfig::default().with_max_jitter(Duration::ZERO));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/wallets/personal");
			then.status(429)
				.header("content-type", "application/json")
				.json_body(json!({ "resetsIn": 0.1, "remaining": 0 }));
		})
		.await;
	let err = client.get_wallet().await.expect_err("Retries should eventually give up.");

	assert_eq!(err.retry_after(), Some(Duration::milliseconds(100)));

	mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn retry_after_header_is_used_without_a_body_hint() {
	let server = MockServer::start_async().await;
	let client = build_client(&server, RateLimitConfig::default().without_retries());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/wallet-transactions");
			then.status(429).header("Retry-After", "17").body("slow down");
		})
		.await;
	let err = client.list_wallet_transactions().await.expect_err("429 should fail.");

	assert_eq!(err.retry_after(), Some(Duration::seconds(17)));
	assert!(err.is_transient());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn success_after_the_gate_lifts_clears_it() {
	let server = MockServer::start_async().await;
	let client = build_client(&server, RateLimitConfig::default().without_retries());
	let mut limited = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/wallets/personal");
			then.status(429)
				.header("content-type", "application/json")
				.json_body(json!({ "resetsIn": 0.2 }));
		})
		.await;

	client.get_wallet().await.expect_err("The first call should be rate limited.");
	limited.delete_async().await;

	let ok = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/wallets/personal");
			then.status(200).header("content-type", "application/json").json_body(json!({}));
		})
		.await;

	tokio::time::sleep(std::time::Duration::from_millis(300)).await;
	client.get_wallet().await.expect("The gate should have lifted.");

	assert!(client.rate_limited_until().is_none());

	ok.assert_calls_async(1).await;
}
