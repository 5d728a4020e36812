//! HTTP surface of the proxy.
//!
//! Every route asks the shared [`TokenProvider`] for a credential and relays catalog responses
//! as JSON. Failures become `{ "error": <message> }` bodies: missing or undecodable input maps to
//! `400`, anything upstream maps to `500`.

// crates.io
use axum::{
	Json, Router,
	extract::{
		Path, Query, State,
		rejection::{PathRejection, QueryRejection},
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
// self
use crate::{
	_prelude::*,
	catalog::{AlbumDetail, CatalogClient, SearchQuery},
	provider::TokenProvider,
};

/// Plain-text body served by the liveness route.
pub const LIVENESS_MESSAGE: &str = "Backend server is running!";

/// Shared handler state; cloning is cheap.
#[derive(Clone, Debug)]
pub struct ProxyState {
	/// Token cache shared by every request.
	pub tokens: Arc<TokenProvider>,
	/// Catalog API client.
	pub catalog: Arc<CatalogClient>,
}
impl ProxyState {
	/// Bundles the token provider and catalog client for the router.
	pub fn new(tokens: TokenProvider, catalog: CatalogClient) -> Self {
		Self { tokens: Arc::new(tokens), catalog: Arc::new(catalog) }
	}
}

/// Body of the diagnostic token route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
	/// Current bearer token.
	pub access_token: String,
	/// Whole seconds until the token stops being served.
	pub expires_in: i64,
}

/// Body returned for every failed request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	/// Human-readable failure message.
	pub error: String,
}

/// Builds the proxy router with permissive CORS and per-request tracing.
pub fn router(state: ProxyState) -> Router {
	Router::new()
		.route("/", get(liveness))
		.route("/token", get(token))
		.route("/search", get(search))
		.route("/album/{album_id}", get(album_detail))
		.layer(CorsLayer::permissive())
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn liveness() -> &'static str {
	LIVENESS_MESSAGE
}

async fn token(State(state): State<ProxyState>) -> Result<Json<TokenPayload>> {
	let credential = state.tokens.get_token().await?;
	let expires_in = credential.remaining_at(state.tokens.now()).whole_seconds();

	Ok(Json(TokenPayload { access_token: credential.access_token.expose().to_owned(), expires_in }))
}

async fn search(
	State(state): State<ProxyState>,
	query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<JsonValue>> {
	let Query(query) = query?;

	query.term()?;

	let credential = state.tokens.get_token().await?;

	Ok(Json(state.catalog.search(&credential, &query).await?))
}

async fn album_detail(
	State(state): State<ProxyState>,
	album_id: Result<Path<String>, PathRejection>,
) -> Result<Json<AlbumDetail>> {
	let Path(album_id) = album_id?;
	let credential = state.tokens.get_token().await?;

	Ok(Json(state.catalog.album_detail(&credential, &album_id).await?))
}

impl Error {
	/// HTTP status this error maps to at the route boundary.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::MissingSearchTerm | Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}
impl From<QueryRejection> for Error {
	fn from(rejection: QueryRejection) -> Self {
		Self::InvalidRequest { message: rejection.body_text() }
	}
}
impl From<PathRejection> for Error {
	fn from(rejection: PathRejection) -> Self {
		Self::InvalidRequest { message: rejection.body_text() }
	}
}
impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status_code();

		if status.is_server_error() {
			tracing::warn!(error = %self, "Request failed.");
		}

		(status, Json(ErrorBody { error: self.to_string() })).into_response()
	}
}
