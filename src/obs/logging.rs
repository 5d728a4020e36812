// crates.io
use tracing_subscriber::EnvFilter;
// self
use crate::{_prelude::*, error::ConfigError};

/// Filter applied when neither an explicit directive nor `RUST_LOG` is present.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Resolves the log filter: an explicit directive wins, then `RUST_LOG`, then
/// [`DEFAULT_LOG_FILTER`].
pub fn log_filter(directive: Option<&str>) -> Result<EnvFilter> {
	match directive {
		Some(directive) => EnvFilter::try_new(directive)
			.map_err(|source| ConfigError::InvalidLogFilter { source }.into()),
		None => Ok(EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))),
	}
}

/// Installs the global `tracing` subscriber.
pub fn init_logging(directive: Option<&str>) -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(log_filter(directive)?)
		.try_init()
		.map_err(|source| ConfigError::LoggingInit { source })?;

	Ok(())
}
