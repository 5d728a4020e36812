// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use httpmock::prelude::*;
use time::{Duration, macros};
// self
use catalog_proxy::{
	clock::ManualClock,
	error::{Error, UpstreamAuthError},
	provider::{ProviderDescriptor, TokenProvider},
};

const CLIENT_ID: &str = "client-id";
const CLIENT_SECRET: &str = "client-secret";

fn build_provider(server: &MockServer, clock: &ManualClock) -> TokenProvider {
	let descriptor = ProviderDescriptor::parse(&server.url("/api/token"), &server.url("/v1"))
		.expect("Mock descriptor should validate.");

	TokenProvider::new(descriptor, CLIENT_ID, CLIENT_SECRET)
		.expect("Provider should build with mock credentials.")
		.with_clock(clock.clone())
}

fn token_body(access_token: &str, expires_in: u64) -> String {
	format!("{{\"access_token\":\"{access_token}\",\"token_type\":\"Bearer\",\"expires_in\":{expires_in}}}")
}

#[tokio::test]
async fn token_is_cached_within_lifetime() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
	let provider = build_provider(&server, &clock);
	let basic = format!("Basic {}", STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.header("authorization", basic.as_str())
				.body("grant_type=client_credentials");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("cached-token", 3600));
		})
		.await;
	let first = provider.get_token().await.expect("Initial token request should succeed.");

	clock.advance(Duration::minutes(59));

	let second = provider.get_token().await.expect("Cached token should be served.");

	assert_eq!(first.access_token.expose(), "cached-token");
	assert_eq!(second.access_token, first.access_token);
	assert_eq!(first.expires_at, macros::datetime!(2025-01-01 01:00 UTC));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn expired_token_is_fetched_again() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
	let provider = build_provider(&server, &clock);
	let mut first_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200).header("content-type", "application/json").body(token_body("first", 60));
		})
		.await;
	let first = provider.get_token().await.expect("Initial token request should succeed.");

	first_mock.assert_calls_async(1).await;
	first_mock.delete_async().await;

	let second_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200).header("content-type", "application/json").body(token_body("second", 60));
		})
		.await;

	clock.advance(Duration::seconds(60));

	let second = provider.get_token().await.expect("Expired token should be renewed.");

	assert_eq!(first.access_token.expose(), "first");
	assert_eq!(second.access_token.expose(), "second");
	assert_eq!(second.expires_at, macros::datetime!(2025-01-01 00:02 UTC));

	second_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn rejected_credentials_surface_status_and_leave_cache_empty() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
	let provider = build_provider(&server, &clock);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\",\"error_description\":\"Invalid client\"}");
		})
		.await;
	let err = provider.get_token().await.expect_err("Rejected credentials should fail.");

	match err {
		Error::UpstreamAuth(auth) => {
			assert_eq!(auth.status(), Some(401));
			assert!(auth.to_string().contains("invalid_client: Invalid client"));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
	assert!(provider.cached().is_none());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn missing_lifetime_is_rejected() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
	let provider = build_provider(&server, &clock);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"no-expiry\",\"token_type\":\"Bearer\"}");
		})
		.await;

	let err = provider.get_token().await.expect_err("Tokens without a lifetime should fail.");

	assert!(matches!(err, Error::UpstreamAuth(_)));
	assert!(provider.cached().is_none());
}

#[tokio::test]
async fn concurrent_callers_share_one_exchange() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
	let provider = build_provider(&server, &clock);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(100))
				.body(token_body("shared", 3600));
		})
		.await;
	let (a, b, c) = tokio::join!(provider.get_token(), provider.get_token(), provider.get_token());

	for credential in [a, b, c] {
		assert_eq!(
			credential.expect("Every concurrent caller should receive a token.").access_token.expose(),
			"shared"
		);
	}

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn unrepresentable_lifetime_is_rejected_without_panicking() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
	let provider = build_provider(&server, &clock);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("far-future", 1_000_000_000_000));
		})
		.await;

	let err = provider.get_token().await.expect_err("Out-of-range lifetimes should fail.");

	assert!(matches!(
		err,
		Error::UpstreamAuth(UpstreamAuthError::InvalidExpiresIn { expires_in: 1_000_000_000_000 })
	));
	assert!(provider.cached().is_none());
}
