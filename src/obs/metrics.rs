//! Operation counters and latencies; every function compiles to a no-op without the `metrics`
//! feature.

// self
use crate::{
	_prelude::*,
	obs::{OpKind, OpOutcome},
};

/// Bumps `monta_client_op_total{op,outcome}`.
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("monta_client_op_total", "op" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records the latency of a finished operation under `monta_client_op_duration_seconds{op}` and,
/// for failures, bumps `monta_client_op_errors_total{op,error}` with the error class.
pub fn record_op_finish(kind: OpKind, elapsed: std::time::Duration, error: Option<&Error>) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!("monta_client_op_duration_seconds", "op" => kind.as_str())
			.record(elapsed.as_secs_f64());

		if let Some(error) = error {
			metrics::counter!(
				"monta_client_op_errors_total",
				"op" => kind.as_str(),
				"error" => error_class(error)
			)
			.increment(1);
		}
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, elapsed, error);
	}
}

#[cfg(feature = "metrics")]
fn error_class(error: &Error) -> &'static str {
	match error {
		Error::Storage(_) => "storage",
		Error::Config(_) => "config",
		Error::Communication(_) => "communication",
		Error::RateLimit(_) => "rate_limit",
		Error::Authentication { .. } => "authentication",
		Error::ResponseParse { .. } => "response_parse",
		Error::Unexpected { .. } => "unexpected",
		Error::InvalidState { .. } | Error::NoActiveCharge { .. } => "charge_state",
	}
}
