//! Redacting wrapper for bearer access tokens.

// self
use crate::_prelude::*;

/// Bearer access token issued by the provider; formatting never reveals the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);
impl AccessToken {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Renders the `Authorization` header value for this token.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl From<String> for AccessToken {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl From<&str> for AccessToken {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessToken").field(&"<redacted>").finish()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
