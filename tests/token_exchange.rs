//! Integration tests for the JWT-bearer token exchange.
//!
//! These tests verify that the JwtAuthProvider correctly:
//! - Reuses cached tokens within their validity margin
//! - Re-fetches when the cached token is within the expiry margin
//! - Classifies consent-required failures with usable consent URLs
//! - Surfaces other token-endpoint failures with status and body
//! - Serializes concurrent cache misses into a single exchange

use std::sync::OnceLock;

use quillgate::auth::{AccessTokenProvider, AuthError, JwtAuthProvider};
use quillgate::config::AuthConfig;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

/// RSA keygen is expensive; generate one key per test binary.
fn test_key_pem() -> &'static str {
    static PEM: OnceLock<String> = OnceLock::new();
    PEM.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
            .unwrap()
            .to_pkcs8_pem(LineEnding::LF)
            .unwrap()
            .to_string()
    })
}

fn provider_for(server: &MockServer) -> JwtAuthProvider {
    let config = AuthConfig::builder()
        .integration_key("test-ik")
        .user_id("test-user")
        .auth_base_url(server.uri())
        .key_pem(test_key_pem())
        .build()
        .unwrap();
    JwtAuthProvider::new(config)
}

fn token_response(token: &str, expires_in: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_in": expires_in
    }))
}

#[tokio::test]
async fn test_token_cached_within_validity_margin() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
        .and(body_string_contains("assertion="))
        .respond_with(token_response("tok-1", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);

    let first = provider.get_access_token().await.unwrap();
    let second = provider.get_access_token().await.unwrap();

    assert_eq!(first.token, second.token);
    assert_eq!(first.token_type, "Bearer");
    assert_eq!(first.expires_at, second.expires_at);
}

#[tokio::test]
async fn test_token_within_expiry_margin_is_refetched() {
    let server = MockServer::start().await;

    // expires_in of 60s caches a token that is already past its margin.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(token_response("tok-short", 60))
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider_for(&server);

    provider.get_access_token().await.unwrap();
    provider.get_access_token().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_misses_perform_one_exchange() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(token_response("tok-1", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);

    let (a, b) = tokio::join!(provider.get_access_token(), provider.get_access_token());
    assert_eq!(a.unwrap().token, b.unwrap().token);
}

#[tokio::test]
async fn test_consent_required_classification() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": "consent_required"})),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let error = provider.get_access_token().await.unwrap_err();

    let AuthError::ConsentRequired { urls } = error else {
        panic!("expected ConsentRequired, got {error:?}");
    };

    let parsed = Url::parse(&urls.user_consent_url).unwrap();
    assert_eq!(parsed.path(), "/oauth/auth");

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(pairs.contains(&("response_type".into(), "code".into())));
    assert!(pairs.contains(&("scope".into(), "signature impersonation".into())));
    assert!(pairs.contains(&("client_id".into(), "test-ik".into())));

    assert_eq!(urls.user_consent_url, urls.admin_consent_url);
}

#[tokio::test]
async fn test_consent_mentioned_in_description() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "user consent has not been granted"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let error = provider.get_access_token().await.unwrap_err();
    assert!(matches!(error, AuthError::ConsentRequired { .. }));
}

#[tokio::test]
async fn test_generic_token_exchange_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream broke"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let error = provider.get_access_token().await.unwrap_err();

    let AuthError::TokenExchange { status, body } = error else {
        panic!("expected TokenExchange, got {error:?}");
    };
    assert_eq!(status, 500);
    assert_eq!(body, "upstream broke");
}

#[tokio::test]
async fn test_unparseable_key_fails_before_any_network_call() {
    // No mocks mounted: a key failure must not reach the token endpoint.
    let server = MockServer::start().await;

    let config = AuthConfig::builder()
        .integration_key("test-ik")
        .user_id("test-user")
        .auth_base_url(server.uri())
        .key_pem("not a key")
        .build()
        .unwrap();

    let provider = JwtAuthProvider::new(config);
    let error = provider.get_access_token().await.unwrap_err();
    assert!(matches!(error, AuthError::Key(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
