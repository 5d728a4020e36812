// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::Operation};

/// A span builder used by proxy operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	span: Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: Operation, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("catalog_proxy.op", op = op.as_str(), stage) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}
