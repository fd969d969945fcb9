//! Token Issuer Tests
//!
//! Tests for the service account token flow:
//! - Assertion signing and claim contents
//! - Client-credentials form body
//! - Failure handling (bad key, HTTP errors, missing access_token)

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use mdh_reminders::{Assertion, MdhError, ServiceAccountCredential, TokenIssuer};
use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const TEST_PRIVATE_KEY: &str = include_str!("fixtures/test_private_key.pem");
const TEST_PUBLIC_KEY: &str = include_str!("fixtures/test_public_key.pem");

fn credential() -> ServiceAccountCredential {
    ServiceAccountCredential::new("MyServiceAccount", TEST_PRIVATE_KEY)
}

/// Pull `client_assertion` out of the single form request the server saw
async fn captured_assertion(mock_server: &MockServer) -> String {
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    url::form_urlencoded::parse(&requests[0].body)
        .find(|(key, _)| key == "client_assertion")
        .map(|(_, value)| value.into_owned())
        .expect("client_assertion field present")
}

// ============================================================================
// Successful Exchange
// ============================================================================

#[tokio::test]
async fn test_issue_token_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identityserver/connect/token"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("scope=api"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains(
            "client_assertion_type=urn%3Aietf%3Aparams%3Aoauth%3Aclient-assertion-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("client_assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access_abc123",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let issuer = TokenIssuer::new(mock_server.uri());
    let token = issuer.issue_token(&credential()).await.unwrap();

    assert_eq!(token.as_str(), "access_abc123");
}

#[tokio::test]
async fn test_signed_assertion_verifies_with_public_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identityserver/connect/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "access_abc123"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let issuer = TokenIssuer::new(mock_server.uri());
    issuer.issue_token(&credential()).await.unwrap();

    let assertion = captured_assertion(&mock_server).await;
    let audience = format!("{}/identityserver/connect/token", mock_server.uri());

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[audience.as_str()]);
    validation.set_issuer(&["MyServiceAccount"]);

    let decoding_key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
    let claims = decode::<Assertion>(&assertion, &decoding_key, &validation)
        .unwrap()
        .claims;

    assert_eq!(claims.iss, "MyServiceAccount");
    assert_eq!(claims.sub, "MyServiceAccount");
    assert_eq!(claims.aud, audience);
    assert!(!claims.jti.is_empty());
}

#[tokio::test]
async fn test_each_request_uses_fresh_jti() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identityserver/connect/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "access_abc123"})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let issuer = TokenIssuer::new(mock_server.uri());
    issuer.issue_token(&credential()).await.unwrap();
    issuer.issue_token(&credential()).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let jtis: Vec<String> = requests
        .iter()
        .map(|request| {
            let assertion = url::form_urlencoded::parse(&request.body)
                .find(|(key, _)| key == "client_assertion")
                .map(|(_, value)| value.into_owned())
                .unwrap();
            let mut validation = Validation::new(Algorithm::RS256);
            validation.validate_aud = false;
            let key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
            decode::<Assertion>(&assertion, &key, &validation)
                .unwrap()
                .claims
                .jti
        })
        .collect();

    assert_eq!(jtis.len(), 2);
    assert_ne!(jtis[0], jtis[1]);
}

#[tokio::test]
async fn test_escaped_private_key_is_normalized_before_signing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identityserver/connect/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "access_abc123"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let escaped = TEST_PRIVATE_KEY.trim_end().replace('\n', "\\n");
    let credential = ServiceAccountCredential::new("MyServiceAccount", escaped);

    let issuer = TokenIssuer::new(mock_server.uri());
    assert!(issuer.issue_token(&credential).await.is_ok());
}

// ============================================================================
// Failure Handling
// ============================================================================

#[tokio::test]
async fn test_malformed_key_makes_no_network_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identityserver/connect/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let issuer = TokenIssuer::new(mock_server.uri());
    let credential = ServiceAccountCredential::new("MyServiceAccount", "not-a-pem-key");

    let result = issuer.issue_token(&credential).await;
    assert!(matches!(result, Err(MdhError::Signing(_))));
}

#[tokio::test]
async fn test_missing_access_token_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identityserver/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let issuer = TokenIssuer::new(mock_server.uri());
    let result = issuer.issue_token(&credential()).await;

    assert!(matches!(result, Err(MdhError::TokenExchange(_))));
}

#[tokio::test]
async fn test_empty_access_token_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identityserver/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": ""})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let issuer = TokenIssuer::new(mock_server.uri());
    assert!(issuer.issue_token(&credential()).await.is_err());
}

#[tokio::test]
async fn test_token_endpoint_rejects_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identityserver/connect/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_client"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let issuer = TokenIssuer::new(mock_server.uri());
    let error = issuer.issue_token(&credential()).await.unwrap_err();

    assert!(matches!(error, MdhError::TokenExchange(_)));
    assert!(error.to_string().contains("400"));
}

#[tokio::test]
async fn test_token_response_not_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identityserver/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let issuer = TokenIssuer::new(mock_server.uri());
    assert!(matches!(
        issuer.issue_token(&credential()).await,
        Err(MdhError::TokenExchange(_))
    ));
}

#[tokio::test]
async fn test_unreachable_token_endpoint() {
    let issuer = TokenIssuer::new("http://127.0.0.1:1");
    let result = issuer.issue_token(&credential()).await;

    assert!(matches!(result, Err(MdhError::TokenExchange(_))));
}
