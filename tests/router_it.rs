// crates.io
use axum::{
	Router,
	body::Body,
	http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::{Value, json};
use time::{Duration, macros};
use tower::ServiceExt;
// self
use catalog_proxy::{
	catalog::CatalogClient,
	clock::ManualClock,
	provider::{ProviderDescriptor, TokenProvider},
	reqwest,
	router::{self, LIVENESS_MESSAGE, ProxyState},
};

const ACCESS_TOKEN: &str = "router-token";

fn build_router(server: &MockServer, clock: &ManualClock) -> Router {
	let descriptor = ProviderDescriptor::parse(&server.url("/api/token"), &server.url("/v1"))
		.expect("Mock descriptor should validate.");
	let tokens = TokenProvider::new(descriptor.clone(), "client-id", "client-secret")
		.expect("Provider should build with mock credentials.")
		.with_clock(clock.clone());
	let catalog = CatalogClient::new(reqwest::Client::new(), &descriptor);

	router::router(ProxyState::new(tokens, catalog))
}

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"access_token\":\"{ACCESS_TOKEN}\",\"token_type\":\"Bearer\",\"expires_in\":3600}}"
			));
		})
		.await
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
	let response = app
		.oneshot(Request::builder().uri(uri).body(Body::empty()).expect("Request should build."))
		.await
		.expect("Router should always produce a response.");
	let status = response.status();
	let body = response
		.into_body()
		.collect()
		.await
		.expect("Response body should be readable.")
		.to_bytes()
		.to_vec();

	(status, body)
}

fn json_body(body: &[u8]) -> Value {
	serde_json::from_slice(body).expect("Response body should be JSON.")
}

#[tokio::test]
async fn liveness_needs_no_upstream() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let (status, body) = get(build_router(&server, &ManualClock::default()), "/").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, LIVENESS_MESSAGE.as_bytes());

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn search_without_term_is_rejected_before_token_fetch() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let clock = ManualClock::default();

	for uri in ["/search", "/search?q="] {
		let (status, body) = get(build_router(&server, &clock), uri).await;

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(json_body(&body), json!({ "error": "Search term (q) is required" }));
	}

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn undecodable_requests_are_rejected_as_json() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let clock = ManualClock::default();

	for (uri, fragment) in [("/search?q=a&q=b", "duplicate field"), ("/album/%FF", "UTF-8")] {
		let (status, body) = get(build_router(&server, &clock), uri).await;
		let body = json_body(&body);

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body.as_object().map(|fields| fields.len()), Some(1));
		assert!(
			body["error"].as_str().is_some_and(|message| message.contains(fragment)),
			"Error body should describe the decoding failure: {body}."
		);
	}

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn search_relays_upstream_body_with_bearer_token() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let upstream = json!({ "albums": { "items": [{ "id": "4aawyAB9vmqN3uQ7FjRGTy" }] } });
	let search = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/search")
				.query_param("q", "test")
				.query_param("type", "album,artist,track")
				.header("authorization", format!("Bearer {ACCESS_TOKEN}"));
			then.status(200).json_body(upstream.clone());
		})
		.await;
	let (status, body) = get(build_router(&server, &ManualClock::default()), "/search?q=test").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json_body(&body), upstream);

	token.assert_calls_async(1).await;
	search.assert_calls_async(1).await;
}

#[tokio::test]
async fn search_upstream_failure_maps_to_internal_error() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/search");
			then.status(429);
		})
		.await;

	let (status, body) = get(build_router(&server, &ManualClock::default()), "/search?q=test").await;
	let body = json_body(&body);

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(
		body["error"].as_str().is_some_and(|message| message.contains("429")),
		"Error body should mention the upstream status: {body}."
	);
}

#[tokio::test]
async fn album_detail_joins_both_bodies() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let album = json!({ "id": "4aawyAB9vmqN3uQ7FjRGTy", "name": "Global Warming" });
	let tracks = json!({ "items": [{ "track_number": 1 }], "limit": 50 });
	let album_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/albums/4aawyAB9vmqN3uQ7FjRGTy")
				.header("authorization", format!("Bearer {ACCESS_TOKEN}"));
			then.status(200).json_body(album.clone());
		})
		.await;
	let tracks_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/albums/4aawyAB9vmqN3uQ7FjRGTy/tracks")
				.query_param("limit", "50")
				.header("authorization", format!("Bearer {ACCESS_TOKEN}"));
			then.status(200).json_body(tracks.clone());
		})
		.await;
	let (status, body) =
		get(build_router(&server, &ManualClock::default()), "/album/4aawyAB9vmqN3uQ7FjRGTy").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json_body(&body), json!({ "albumData": album, "tracksData": tracks }));

	album_mock.assert_calls_async(1).await;
	tracks_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn album_detail_fails_whole_when_one_half_fails() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/albums/missing");
			then.status(404);
		})
		.await;

	let tracks_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/albums/missing/tracks");
			then.status(200).json_body(json!({ "items": [] }));
		})
		.await;
	let (status, body) = get(build_router(&server, &ManualClock::default()), "/album/missing").await;
	let body = json_body(&body);

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body.as_object().map(|fields| fields.len()), Some(1));
	assert!(body["error"].as_str().is_some_and(|message| message.contains("404")));

	tracks_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn token_route_reports_remaining_lifetime() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
	let app = build_router(&server, &clock);
	let (status, body) = get(app.clone(), "/token").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json_body(&body), json!({ "access_token": ACCESS_TOKEN, "expires_in": 3600 }));

	clock.advance(Duration::minutes(10));

	let (status, body) = get(app, "/token").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json_body(&body), json!({ "access_token": ACCESS_TOKEN, "expires_in": 3000 }));

	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn token_route_maps_auth_failure_to_internal_error() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;

	let (status, body) = get(build_router(&server, &ManualClock::default()), "/token").await;
	let body = json_body(&body);

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(body["error"].as_str().is_some_and(|message| message.contains("invalid_client")));
}
