//! Token provider: obtains and memoizes the proxy's client-credentials access token.
//!
//! [`TokenProvider::get_token`] serves the cached [`Credential`] while `now < expires_at` without
//! touching the network. Once the credential is missing or stale, a single-flight guard lets
//! exactly one caller perform the exchange while concurrent callers wait and then reuse the
//! fresh credential. Failed exchanges never touch the cache.

pub mod descriptor;

pub use descriptor::*;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	clock::{Clock, SystemClock},
	error::{ConfigError, UpstreamAuthError},
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::ClientCredentialsExchange,
	obs::{self, OpSpan, Operation, Outcome},
};

/// Memoizing source of bearer credentials for catalog requests.
pub struct TokenProvider<C = ReqwestHttpClient>
where
	C: TokenHttpClient,
{
	token_endpoint: Url,
	client_id: String,
	exchange: ClientCredentialsExchange<C>,
	clock: Arc<dyn Clock>,
	refresh_margin: Duration,
	cache: RwLock<Option<Credential>>,
	refresh_guard: AsyncMutex<()>,
}
impl<C> TokenProvider<C>
where
	C: TokenHttpClient,
{
	/// Creates a provider that reuses the caller-provided transport.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		let client_id = client_id.into();
		let client_secret = client_secret.into();

		if client_id.is_empty() || client_secret.is_empty() {
			return Err(ConfigError::MissingClientCredentials.into());
		}

		let exchange = ClientCredentialsExchange::new(
			&descriptor.token_endpoint,
			&client_id,
			&client_secret,
			http_client.into(),
		)?;

		Ok(Self {
			token_endpoint: descriptor.token_endpoint,
			client_id,
			exchange,
			clock: Arc::new(SystemClock),
			refresh_margin: Duration::ZERO,
			cache: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
		})
	}

	/// Replaces the time source used for expiry checks.
	pub fn with_clock(mut self, clock: impl 'static + Clock) -> Self {
		self.clock = Arc::new(clock);

		self
	}

	/// Renews credentials once they are within `margin` of expiring (defaults to zero).
	pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Current instant according to the provider's clock.
	pub fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}

	/// Returns the cached credential if it is still usable, without contacting upstream.
	pub fn cached(&self) -> Option<Credential> {
		self.fresh_credential(self.clock.now())
	}

	/// Drops the cached credential so the next call performs a new exchange.
	pub fn invalidate(&self) {
		*self.cache.write() = None;
	}

	/// Returns a usable credential, performing the client-credentials grant on a cache miss.
	pub async fn get_token(&self) -> Result<Credential> {
		const OP: Operation = Operation::Token;

		if let Some(credential) = self.cached() {
			obs::record_outcome(OP, Outcome::Cached);
			tracing::debug!(expires_at = %credential.expires_at, "Serving cached access token.");

			return Ok(credential);
		}

		let span = OpSpan::new(OP, "get_token");

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span.instrument(self.refresh()).await;

		match &result {
			Ok(_) => obs::record_outcome(OP, Outcome::Success),
			Err(e) => {
				let status = match e {
					Error::UpstreamAuth(auth) => auth.status(),
					_ => None,
				};

				obs::record_outcome(OP, Outcome::Failure);
				tracing::warn!(error = %e, ?status, "Failed to fetch access token.");
			},
		}

		result
	}

	async fn refresh(&self) -> Result<Credential> {
		let _singleflight = self.refresh_guard.lock().await;

		// Another caller may have refreshed while this one waited on the guard.
		if let Some(credential) = self.cached() {
			return Ok(credential);
		}

		let issued_at = self.clock.now();
		let granted = self.exchange.exchange().await?;
		let credential = Credential::new(granted.access_token, issued_at, granted.expires_in)
			.ok_or(UpstreamAuthError::InvalidExpiresIn {
				expires_in: granted.expires_in.whole_seconds().unsigned_abs(),
			})?;

		*self.cache.write() = Some(credential.clone());

		tracing::info!(
			expires_at = %credential.expires_at,
			lifetime_secs = credential.lifetime().whole_seconds(),
			"Fetched new access token."
		);

		Ok(credential)
	}

	fn fresh_credential(&self, now: OffsetDateTime) -> Option<Credential> {
		self.cache
			.read()
			.as_ref()
			.filter(|credential| !credential.needs_refresh_at(now, self.refresh_margin))
			.cloned()
	}
}
impl TokenProvider<ReqwestHttpClient> {
	/// Creates a provider backed by a redirect-free reqwest transport.
	pub fn new(
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self> {
		Self::with_http_client(
			descriptor,
			client_id,
			client_secret,
			ReqwestHttpClient::without_redirects()?,
		)
	}
}
impl<C> Debug for TokenProvider<C>
where
	C: TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("token_endpoint", &self.token_endpoint)
			.field("client_id", &self.client_id)
			.field("refresh_margin", &self.refresh_margin)
			.field("cached", &self.cache.read().is_some())
			.finish()
	}
}
