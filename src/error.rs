//! Proxy-level error types shared across the token provider, catalog client, and routes.

// self
use crate::_prelude::*;

/// Proxy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical proxy error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint rejected the client credentials or could not be reached.
	#[error(transparent)]
	UpstreamAuth(#[from] UpstreamAuthError),
	/// Catalog endpoint returned a non-success status or could not be reached.
	#[error(transparent)]
	UpstreamRequest(#[from] UpstreamRequestError),

	/// Search request omitted the `q` term or sent it empty.
	#[error("Search term (q) is required")]
	MissingSearchTerm,
	/// Request path or query string could not be decoded.
	#[error("{message}")]
	InvalidRequest {
		/// Decoder failure description.
		message: String,
	},
}

/// Configuration and validation failures raised while wiring the proxy.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Token endpoint URL was rejected by the OAuth client.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Listen address could not be assembled.
	#[error("Listen address `{value}` is invalid.")]
	InvalidListenAddress {
		/// Raw address that failed to parse.
		value: String,
	},
	/// Log filter directive could not be parsed.
	#[error("Log filter directive is invalid.")]
	InvalidLogFilter {
		/// Underlying directive parsing failure.
		#[source]
		source: tracing_subscriber::filter::ParseError,
	},
	/// Global tracing subscriber could not be installed.
	#[error("Tracing subscriber could not be installed.")]
	LoggingInit {
		/// Underlying installation failure.
		#[source]
		source: BoxError,
	},

	/// Client identifier or secret is empty.
	#[error("Client identifier and client secret must both be non-empty.")]
	MissingClientCredentials,
	/// API base URL cannot carry path segments.
	#[error("API base URL `{url}` cannot be extended with path segments.")]
	ApiBaseNotHierarchical {
		/// Offending URL.
		url: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while obtaining an access token from the token endpoint.
#[derive(Debug, ThisError)]
pub enum UpstreamAuthError {
	/// Token endpoint answered with a non-success response.
	#[error("Failed to fetch access token ({}): {message}.", describe_status(.status))]
	Rejected {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Provider- or proxy-supplied message summarizing the failure.
		message: String,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Failed to fetch access token ({}): malformed token response.", describe_status(.status))]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Failed to fetch access token: network error while calling the token endpoint.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Token endpoint response omitted `expires_in`.
	#[error("Failed to fetch access token: response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned a lifetime that cannot be represented.
	#[error("Failed to fetch access token: expires_in value {expires_in} is not usable.")]
	InvalidExpiresIn {
		/// Raw lifetime in seconds.
		expires_in: u64,
	},
}
impl UpstreamAuthError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Returns the upstream HTTP status, when one was observed.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } | Self::MalformedResponse { status, .. } => *status,
			_ => None,
		}
	}
}

/// Failures raised while reading from the catalog API.
#[derive(Debug, ThisError)]
pub enum UpstreamRequestError {
	/// Catalog endpoint answered with a non-success status.
	#[error("Catalog request to {endpoint} failed with HTTP {status}.")]
	Status {
		/// Path of the catalog resource.
		endpoint: String,
		/// HTTP status code returned by the catalog.
		status: u16,
	},
	/// Catalog endpoint could not be reached.
	#[error("Catalog request to {endpoint} failed: {source}.")]
	Transport {
		/// Path of the catalog resource.
		endpoint: String,
		/// Underlying network failure.
		#[source]
		source: ReqwestError,
	},
	/// Catalog endpoint returned a body that is not JSON.
	#[error("Catalog request to {endpoint} returned malformed JSON.")]
	MalformedBody {
		/// Path of the catalog resource.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// One or both halves of an album lookup failed.
	#[error("Failed to fetch album details for `{album_id}`: {}", describe_failures(.failures))]
	AlbumDetail {
		/// Album identifier requested by the caller.
		album_id: String,
		/// Every sub-request failure, in request order.
		failures: Vec<UpstreamRequestError>,
	},
}

fn describe_status(status: &Option<u16>) -> String {
	match status {
		Some(code) => format!("HTTP {code}"),
		None => "no HTTP status".into(),
	}
}

fn describe_failures(failures: &[UpstreamRequestError]) -> String {
	failures.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}
