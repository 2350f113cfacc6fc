//! Observability helpers shared by the token manager and domain operations.
//!
//! # Feature Flags
//!
//! - Spans named `monta_client.op` carry the `op` (operation) and `stage` (call site) fields and
//!   are always emitted through `tracing`.
//! - Enable `metrics` to count attempts and outcomes in `monta_client_op_total{op,outcome}`, time
//!   operations in `monta_client_op_duration_seconds{op}`, and classify failures in
//!   `monta_client_op_errors_total{op,error}`.

mod metrics;
mod span;

pub use metrics::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Client operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Client-credential token request.
	Authenticate,
	/// Refresh-token exchange.
	Refresh,
	/// Token state machine entry point.
	GetAccessToken,
	/// `GET charge-points`.
	ListChargePoints,
	/// `GET charges`.
	ListCharges,
	/// `POST charges`.
	StartCharge,
	/// `POST charges/{id}/stop`.
	StopCharge,
	/// `GET wallets/personal`.
	GetWallet,
	/// `GET wallet-transactions`.
	ListWalletTransactions,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Authenticate => "authenticate",
			OpKind::Refresh => "refresh",
			OpKind::GetAccessToken => "get_access_token",
			OpKind::ListChargePoints => "list_charge_points",
			OpKind::ListCharges => "list_charges",
			OpKind::StartCharge => "start_charge",
			OpKind::StopCharge => "stop_charge",
			OpKind::GetWallet => "get_wallet",
			OpKind::ListWalletTransactions => "list_wallet_transactions",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an operation span, recording attempt and outcome counters around it.
pub(crate) async fn observe<T, F>(kind: OpKind, stage: &'static str, fut: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	record_op_outcome(kind, OpOutcome::Attempt);

	let started = std::time::Instant::now();
	let result = OpSpan::new(kind, stage).in_span(fut).await;

	match &result {
		Ok(_) => record_op_outcome(kind, OpOutcome::Success),
		Err(e) => {
			tracing::debug!(op = kind.as_str(), stage, error = %e, "Operation failed.");
			record_op_outcome(kind, OpOutcome::Failure);
		},
	}

	record_op_finish(kind, started.elapsed(), result.as_ref().err());

	result
}
