//! Credential-shielding proxy for music catalog APIs: one cached client-credentials token, a
//! handful of read-only catalog routes, and no secrets ever handed to the browser.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod router;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
use color_eyre as _;
#[cfg(test)] use {base64 as _, httpmock as _, tower as _};
