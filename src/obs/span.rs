// crates.io
use tracing::{Instrument, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::OpKind};

/// Span wrapper used by client operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the operation kind and stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("monta_client.op", op = kind.as_str(), stage) }
	}

	/// Underlying span, for callers that want to attach extra fields.
	pub fn span(&self) -> &tracing::Span {
		&self.span
	}

	/// Runs `fut` inside this span without holding a guard across `.await` points.
	pub fn in_span<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}
