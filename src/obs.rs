//! Observability helpers: operation spans, outcome counters, and subscriber setup.
//!
//! # Feature Flags
//!
//! - Spans are always emitted through `tracing`, named `catalog_proxy.op` with the `op`
//!   (operation) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `catalog_proxy_op_total` counter for every
//!   attempt/cache hit/success/failure, labeled by `op` + `outcome`.

mod counter;
mod logging;
mod span;

pub use counter::*;
pub use logging::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Operations observed by the proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Access-token lookup through the token provider.
	Token,
	/// Catalog search relay.
	Search,
	/// Album metadata + track listing fan-out.
	AlbumDetail,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Token => "token",
			Operation::Search => "search",
			Operation::AlbumDetail => "album_detail",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation that will reach upstream.
	Attempt,
	/// Served from the in-memory cache without reaching upstream.
	Cached,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Cached => "cached",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
