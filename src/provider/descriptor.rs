//! Provider descriptor: the token endpoint and catalog API base consumed by the proxy.
//!
//! Descriptors are validated once at construction so request paths never re-check URLs.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Token endpoint used when none is configured.
pub const SPOTIFY_TOKEN_ENDPOINT: &str = "https://accounts.spotify.com/api/token";
/// Catalog API base used when none is configured.
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Immutable provider descriptor consumed by the token provider and catalog client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderDescriptor {
	/// OAuth 2.0 token endpoint accepting the client-credentials grant.
	pub token_endpoint: Url,
	/// Base URL that catalog resource paths (`search`, `albums/...`) are appended to.
	pub api_base: Url,
}
impl ProviderDescriptor {
	/// Creates a new builder.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::default()
	}

	/// Parses and validates both endpoints from raw strings.
	pub fn parse(token_endpoint: &str, api_base: &str) -> Result<Self, ProviderDescriptorError> {
		Self::builder()
			.token_endpoint(parse_endpoint("token", token_endpoint)?)
			.api_base(parse_endpoint("api_base", api_base)?)
			.build()
	}

	/// Descriptor for the public Spotify Web API.
	pub fn spotify() -> Result<Self, ProviderDescriptorError> {
		Self::parse(SPOTIFY_TOKEN_ENDPOINT, SPOTIFY_API_BASE)
	}
}

fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(raw).map_err(|source| ProviderDescriptorError::InvalidUrl { endpoint, source })
}
