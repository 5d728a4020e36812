//! Client-credentials exchange against the provider's token endpoint.
//!
//! The exchange authenticates the proxy itself with HTTP Basic client authentication and a
//! `grant_type=client_credentials` form body, then normalizes the response into a
//! [`GrantedToken`]. Every failure maps into [`UpstreamAuthError`] with the HTTP status recorded
//! by the transport whenever one was observed.

pub use oauth2;

// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::{ConfigError, UpstreamAuthError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Access token plus the lifetime reported by the token endpoint.
#[derive(Clone, Debug)]
pub struct GrantedToken {
	/// Issued access token.
	pub access_token: AccessToken,
	/// Provider-reported lifetime; always positive.
	pub expires_in: Duration,
}

/// OAuth client bound to one token endpoint and one set of client credentials.
pub(crate) struct ClientCredentialsExchange<C>
where
	C: TokenHttpClient,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
}
impl<C> ClientCredentialsExchange<C>
where
	C: TokenHttpClient,
{
	pub(crate) fn new(
		token_endpoint: &Url,
		client_id: &str,
		client_secret: &str,
		http_client: Arc<C>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidTokenEndpoint { source })?;
		let oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_token_uri(token_url);

		Ok(Self { oauth_client, http_client })
	}

	/// Performs one `client_credentials` grant.
	pub(crate) async fn exchange(&self) -> Result<GrantedToken> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(&response).map_err(Error::from)
	}
}

fn map_token_response(
	response: &BasicTokenResponse,
) -> Result<GrantedToken, UpstreamAuthError> {
	let expires_in = response.expires_in().ok_or(UpstreamAuthError::MissingExpiresIn)?.as_secs();
	let seconds = i64::try_from(expires_in)
		.ok()
		.filter(|secs| *secs > 0)
		.ok_or(UpstreamAuthError::InvalidExpiresIn { expires_in })?;

	Ok(GrantedToken {
		access_token: AccessToken::new(response.access_token().secret().to_owned()),
		expires_in: Duration::seconds(seconds),
	})
}

fn map_request_error<E>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) =>
			UpstreamAuthError::Rejected { status, message: describe_server_error(&response) }
				.into(),
		RequestTokenError::Request(error) => map_transport_error(status, error),
		RequestTokenError::Parse(source, _body) =>
			UpstreamAuthError::MalformedResponse { source, status }.into(),
		RequestTokenError::Other(message) =>
			UpstreamAuthError::Rejected { status, message }.into(),
	}
}

fn map_transport_error<E>(status: Option<u16>, err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => UpstreamAuthError::transport(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => UpstreamAuthError::transport(inner).into(),
		HttpClientError::Other(message) => UpstreamAuthError::Rejected { status, message }.into(),
		_ => UpstreamAuthError::Rejected {
			status,
			message: "unrecognized HTTP client failure".into(),
		}
		.into(),
	}
}

fn describe_server_error(response: &BasicErrorResponse) -> String {
	let code = response.error().as_ref();

	match response.error_description() {
		Some(description) => format!("{code}: {description}"),
		None => code.to_owned(),
	}
}
