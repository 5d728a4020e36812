// self
use crate::obs::{Operation, Outcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(op: Operation, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"catalog_proxy_op_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}
