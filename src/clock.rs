//! Time sources consulted by the token cache.

// self
use crate::_prelude::*;

/// Source of the current instant used for credential expiry checks.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock; clones share the same instant.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(start)))
	}

	/// Moves the clock forward (or backward, for negative values) by `delta`.
	pub fn advance(&self, delta: Duration) {
		*self.0.lock() += delta;
	}

	/// Pins the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new(OffsetDateTime::now_utc())
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}
