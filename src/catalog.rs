//! Bearer-authorized reads against the catalog REST API.
//!
//! Response bodies are relayed as opaque [`JsonValue`]s so callers see exactly what the
//! provider returned. [`CatalogClient::album_detail`] issues the album metadata and track
//! listing requests concurrently and fails as a whole if either half fails.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::{ConfigError, UpstreamRequestError},
	obs::{self, OpSpan, Operation, Outcome},
	provider::ProviderDescriptor,
};

/// Page size requested for album track listings; further pages are not fetched.
pub const ALBUM_TRACKS_PAGE_LIMIT: u32 = 50;
/// Result types requested from the search endpoint when the caller names none.
pub const DEFAULT_SEARCH_TYPES: &str = "album,artist,track";

/// Inbound search parameters.
///
/// Only `q` is interpreted locally; the optional refinements are forwarded verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SearchQuery {
	/// Free-text search term.
	pub q: Option<String>,
	/// Comma-separated result types (`album`, `artist`, `track`, ...).
	#[serde(rename = "type")]
	pub kind: Option<String>,
	/// Maximum number of results per type.
	pub limit: Option<String>,
	/// Index of the first result to return.
	pub offset: Option<String>,
	/// ISO 3166-1 alpha-2 market code.
	pub market: Option<String>,
}
impl SearchQuery {
	/// Creates a query for `term` with no refinements.
	pub fn new(term: impl Into<String>) -> Self {
		Self { q: Some(term.into()), ..Default::default() }
	}

	/// Returns the search term, rejecting absent or empty values.
	pub fn term(&self) -> Result<&str> {
		match self.q.as_deref() {
			Some(term) if !term.is_empty() => Ok(term),
			_ => Err(Error::MissingSearchTerm),
		}
	}
}

/// Album metadata and its first page of tracks, relayed together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlbumDetail {
	/// Album metadata body.
	#[serde(rename = "albumData")]
	pub album_data: JsonValue,
	/// Album track listing body.
	#[serde(rename = "tracksData")]
	pub tracks_data: JsonValue,
}

/// Read-only client for the catalog API.
#[derive(Clone, Debug)]
pub struct CatalogClient {
	http_client: ReqwestClient,
	api_base: Url,
}
impl CatalogClient {
	/// Creates a client rooted at the descriptor's API base.
	pub fn new(http_client: ReqwestClient, descriptor: &ProviderDescriptor) -> Self {
		Self { http_client, api_base: descriptor.api_base.clone() }
	}

	/// Builds the search URL with every parameter query-escaped.
	pub fn search_url(&self, query: &SearchQuery) -> Result<Url> {
		let term = query.term()?;
		let mut url = self.resource_url(&["search"])?;

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair("q", term);
			pairs.append_pair("type", query.kind.as_deref().unwrap_or(DEFAULT_SEARCH_TYPES));

			for (key, value) in [
				("limit", query.limit.as_deref()),
				("offset", query.offset.as_deref()),
				("market", query.market.as_deref()),
			] {
				if let Some(value) = value {
					pairs.append_pair(key, value);
				}
			}
		}

		Ok(url)
	}

	/// Builds the album metadata URL; `album_id` is escaped as one path segment.
	pub fn album_url(&self, album_id: &str) -> Result<Url> {
		self.resource_url(&["albums", album_id])
	}

	/// Builds the album track listing URL capped at [`ALBUM_TRACKS_PAGE_LIMIT`] items.
	pub fn album_tracks_url(&self, album_id: &str) -> Result<Url> {
		let mut url = self.resource_url(&["albums", album_id, "tracks"])?;

		url.query_pairs_mut().append_pair("limit", &ALBUM_TRACKS_PAGE_LIMIT.to_string());

		Ok(url)
	}

	/// Relays one search request.
	pub async fn search(&self, credential: &Credential, query: &SearchQuery) -> Result<JsonValue> {
		const OP: Operation = Operation::Search;

		let url = self.search_url(query)?;
		let span = OpSpan::new(OP, "search");

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span.instrument(self.get_json(credential, url)).await;

		record(OP, &result);

		Ok(result?)
	}

	/// Fetches album metadata and track listing concurrently with the same credential.
	///
	/// Both requests always run to completion; if either fails the whole lookup fails with a
	/// single [`UpstreamRequestError::AlbumDetail`] listing every failure.
	pub async fn album_detail(&self, credential: &Credential, album_id: &str) -> Result<AlbumDetail> {
		const OP: Operation = Operation::AlbumDetail;

		let album_url = self.album_url(album_id)?;
		let tracks_url = self.album_tracks_url(album_id)?;
		let span = OpSpan::new(OP, "album_detail");

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span
			.instrument(async {
				let (album, tracks) = tokio::join!(
					self.get_json(credential, album_url),
					self.get_json(credential, tracks_url),
				);

				match (album, tracks) {
					(Ok(album_data), Ok(tracks_data)) => Ok(AlbumDetail { album_data, tracks_data }),
					(album, tracks) => Err(UpstreamRequestError::AlbumDetail {
						album_id: album_id.to_owned(),
						failures: [album.err(), tracks.err()].into_iter().flatten().collect(),
					}),
				}
			})
			.await;

		record(OP, &result);

		Ok(result?)
	}

	fn resource_url(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.api_base.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::ApiBaseNotHierarchical { url: self.api_base.to_string() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}

	async fn get_json(
		&self,
		credential: &Credential,
		url: Url,
	) -> Result<JsonValue, UpstreamRequestError> {
		let endpoint = url.path().to_owned();
		let response = self
			.http_client
			.get(url)
			.header(reqwest::header::AUTHORIZATION, credential.access_token.bearer())
			.send()
			.await
			.map_err(|source| UpstreamRequestError::Transport { endpoint: endpoint.clone(), source })?;
		let status = response.status();

		if !status.is_success() {
			tracing::warn!(%endpoint, status = status.as_u16(), "Catalog request failed.");

			return Err(UpstreamRequestError::Status { endpoint, status: status.as_u16() });
		}

		let body = response
			.bytes()
			.await
			.map_err(|source| UpstreamRequestError::Transport { endpoint: endpoint.clone(), source })?;

		serde_json::from_slice(&body)
			.map_err(|source| UpstreamRequestError::MalformedBody { endpoint, source })
	}
}

fn record<T>(op: Operation, result: &Result<T, UpstreamRequestError>) {
	match result {
		Ok(_) => obs::record_outcome(op, Outcome::Success),
		Err(_) => obs::record_outcome(op, Outcome::Failure),
	}
}
