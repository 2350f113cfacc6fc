// self
use monta_client::reqwest::Client;

/// Reqwest client that trusts the self-signed certificate `httpmock` serves over HTTPS.
pub fn reqwest_test_client() -> Client {
	Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.")
}

