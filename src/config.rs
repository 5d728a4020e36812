//! Process configuration: CLI flags with environment fallbacks, resolved into a validated
//! [`ProxyConfig`].

// std
use std::net::{IpAddr, SocketAddr};
// crates.io
use clap::Parser;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{ProviderDescriptor, SPOTIFY_API_BASE, SPOTIFY_TOKEN_ENDPOINT},
};

/// Raw command-line arguments; every flag except `--log-level` also reads the environment.
#[derive(Clone, Parser)]
#[command(name = "catalog-proxy", version, about = "Credential-shielding proxy for the Spotify catalog API")]
pub struct ProxyArgs {
	/// OAuth client identifier.
	#[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
	pub client_id: String,
	/// OAuth client secret.
	#[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
	pub client_secret: String,
	/// IP address to listen on.
	#[arg(long, env = "PROXY_HOST", default_value = "0.0.0.0")]
	pub host: String,
	/// TCP port to listen on.
	#[arg(long, env = "PORT", default_value_t = 3000)]
	pub port: u16,
	/// Token endpoint accepting the client-credentials grant.
	#[arg(long, env = "SPOTIFY_TOKEN_URL", default_value = SPOTIFY_TOKEN_ENDPOINT)]
	pub token_url: String,
	/// Catalog API base URL.
	#[arg(long, env = "SPOTIFY_API_BASE_URL", default_value = SPOTIFY_API_BASE)]
	pub api_base_url: String,
	/// Renew the token this many seconds before it expires.
	#[arg(long, env = "TOKEN_REFRESH_MARGIN_SECS", default_value_t = 0)]
	pub token_refresh_margin_secs: u32,
	/// Log filter directive; overrides `RUST_LOG`.
	#[arg(long, value_name = "FILTER")]
	pub log_level: Option<String>,
}
impl ProxyArgs {
	/// Loads `.env` when present, then parses the process arguments.
	pub fn load() -> Self {
		dotenvy::dotenv().ok();

		Self::parse()
	}
}

/// Validated runtime configuration.
#[derive(Clone)]
pub struct ProxyConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// Socket address the server binds.
	pub listen: SocketAddr,
	/// Token endpoint and catalog API base.
	pub descriptor: ProviderDescriptor,
	/// Early-renewal window applied by the token provider.
	pub refresh_margin: Duration,
	/// Optional log filter directive.
	pub log_level: Option<String>,
}
impl TryFrom<ProxyArgs> for ProxyConfig {
	type Error = Error;

	fn try_from(args: ProxyArgs) -> Result<Self> {
		if args.client_id.is_empty() || args.client_secret.is_empty() {
			return Err(ConfigError::MissingClientCredentials.into());
		}

		let ip = args
			.host
			.parse::<IpAddr>()
			.map_err(|_| ConfigError::InvalidListenAddress { value: args.host.clone() })?;
		let descriptor = ProviderDescriptor::parse(&args.token_url, &args.api_base_url)
			.map_err(ConfigError::from)?;

		Ok(Self {
			client_id: args.client_id,
			client_secret: args.client_secret,
			listen: SocketAddr::new(ip, args.port),
			descriptor,
			refresh_margin: Duration::seconds(i64::from(args.token_refresh_margin_secs)),
			log_level: args.log_level,
		})
	}
}
impl Debug for ProxyConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProxyConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("listen", &self.listen)
			.field("descriptor", &self.descriptor)
			.field("refresh_margin", &self.refresh_margin)
			.field("log_level", &self.log_level)
			.finish()
	}
}
