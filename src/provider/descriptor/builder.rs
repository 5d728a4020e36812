// self
use crate::{_prelude::*, provider::ProviderDescriptor};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Catalog API base is mandatory.
	#[error("Missing catalog API base URL.")]
	MissingApiBase,
	/// Endpoint string is not an absolute URL.
	#[error("The {endpoint} endpoint is not a valid absolute URL.")]
	InvalidUrl {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTP or HTTPS.
	#[error("The {endpoint} endpoint must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Catalog base must not carry a query or fragment that paths would be appended after.
	#[error("The api_base endpoint must not include a query or fragment: {url}.")]
	ApiBaseHasQuery {
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug, Default)]
pub struct ProviderDescriptorBuilder {
	/// Token endpoint used for the client-credentials grant.
	pub token_endpoint: Option<Url>,
	/// Catalog API base URL.
	pub api_base: Option<Url>,
}
impl ProviderDescriptorBuilder {
	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the catalog API base.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let token_endpoint =
			self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let api_base = self.api_base.ok_or(ProviderDescriptorError::MissingApiBase)?;
		let descriptor = ProviderDescriptor { token_endpoint, api_base };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_scheme("token", &self.token_endpoint)?;
		validate_scheme("api_base", &self.api_base)?;

		if self.api_base.query().is_some() || self.api_base.fragment().is_some() {
			return Err(ProviderDescriptorError::ApiBaseHasQuery { url: self.api_base.to_string() });
		}

		Ok(())
	}
}

fn validate_scheme(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"http" | "https" => Ok(()),
		_ => Err(ProviderDescriptorError::UnsupportedScheme { endpoint: name, url: url.to_string() }),
	}
}
