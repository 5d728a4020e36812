//! Cached credential: an access token plus the absolute instant it stops being usable.

// self
use crate::{_prelude::*, auth::AccessToken};

/// Lifecycle status for a credential at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialStatus {
	/// Credential may be attached to outbound requests.
	Active,
	/// Credential reached its expiry instant and must not be served.
	Expired,
}

/// Bearer credential obtained through the client-credentials grant.
///
/// Values are replaced wholesale on renewal; nothing mutates a credential after it is built.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	/// Access token secret; callers must avoid logging it.
	pub access_token: AccessToken,
	/// Instant the token request was issued.
	pub issued_at: OffsetDateTime,
	/// First instant at which the credential is no longer usable.
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Builds a credential that stays usable for `lifetime` after `issued_at`.
	///
	/// Returns `None` when the expiry instant falls outside the representable date range.
	pub fn new(
		access_token: impl Into<AccessToken>,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Option<Self> {
		let expires_at = issued_at.checked_add(lifetime)?;

		Some(Self { access_token: access_token.into(), issued_at, expires_at })
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> CredentialStatus {
		if instant >= self.expires_at { CredentialStatus::Expired } else { CredentialStatus::Active }
	}

	/// Returns `true` if the credential has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), CredentialStatus::Expired)
	}

	/// Returns `true` when the credential should be renewed at `instant`, treating the final
	/// `margin` of its lifetime as already stale.
	pub fn needs_refresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		if self.is_expired_at(instant) {
			return true;
		}
		if !margin.is_positive() {
			return false;
		}

		self.expires_at - instant <= margin
	}

	/// Remaining usable lifetime at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}

	/// Lifetime reported by the provider when the credential was issued.
	pub fn lifetime(&self) -> Duration {
		self.expires_at - self.issued_at
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
