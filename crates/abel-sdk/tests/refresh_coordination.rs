//! End-to-end refresh coordination against a mock portal API

use abel_sdk::{AbelClient, ApiError, ClientBuilder, CredentialPair, RefreshError, RefreshPhase};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REFRESH_DELAY: Duration = Duration::from_millis(300);

fn client_for(server: &MockServer) -> AbelClient {
    ClientBuilder::default()
        .base_url(server.uri())
        .with_tokens("stale", "r1")
        .build()
        .unwrap()
}

async fn mount_projects(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "statusCode": 401,
            "message": "Unauthorized"
        })))
        .mount(server)
        .await;
}

async fn mount_refresh(server: &MockServer, response: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(response.set_delay(REFRESH_DELAY))
        .expect(calls)
        .mount(server)
        .await;
}

fn issued(access_token: &str, refresh_token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "accessToken": access_token,
        "refreshToken": refresh_token,
    }))
}

async fn calls_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}

#[tokio::test]
async fn test_valid_token_needs_no_refresh() {
    let mock_server = MockServer::start().await;
    mount_projects(&mock_server).await;
    mount_refresh(&mock_server, issued("fresh", "r2"), 0).await;

    let client = ClientBuilder::default()
        .base_url(mock_server.uri())
        .with_tokens("fresh", "r1")
        .build()
        .unwrap();

    let projects = client.list_projects().await.unwrap();

    assert!(projects.is_empty());
    assert_eq!(calls_to(&mock_server, "/projects").await, 1);
    assert_eq!(client.refresh_phase(), RefreshPhase::Idle);
    assert_eq!(client.coordinator().exchanges(), 0);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_replayed() {
    let mock_server = MockServer::start().await;
    mount_projects(&mock_server).await;
    mount_refresh(&mock_server, issued("fresh", "r2"), 1).await;

    let client = client_for(&mock_server);
    client.list_projects().await.unwrap();

    assert_eq!(calls_to(&mock_server, "/projects").await, 2);
    assert_eq!(client.credentials(), Some(CredentialPair::new("fresh", "r2")));
    assert_eq!(client.refresh_phase(), RefreshPhase::Idle);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_refresh() {
    let mock_server = MockServer::start().await;
    mount_projects(&mock_server).await;
    mount_refresh(&mock_server, issued("fresh", "r2"), 1).await;

    let client = client_for(&mock_server);
    let (first, second, third) = futures::join!(
        client.list_projects(),
        client.list_projects(),
        client.list_projects()
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert!(third.is_ok());
    assert_eq!(calls_to(&mock_server, "/auth/refresh").await, 1);
    assert_eq!(calls_to(&mock_server, "/projects").await, 6);
    assert_eq!(client.coordinator().exchanges(), 1);
    assert_eq!(client.coordinator().pending(), 0);
}

#[tokio::test]
async fn test_rejected_refresh_fails_every_caller() {
    let mock_server = MockServer::start().await;
    mount_projects(&mock_server).await;
    mount_refresh(
        &mock_server,
        ResponseTemplate::new(401).set_body_json(json!({
            "statusCode": 401,
            "message": "Invalid refresh token"
        })),
        1,
    )
    .await;

    let client = client_for(&mock_server);
    let (first, second) = futures::join!(client.list_projects(), client.list_projects());

    for result in [first, second] {
        match result.unwrap_err() {
            ApiError::RefreshExchange(RefreshError::Rejected { status }) => assert_eq!(status, 401),
            other => panic!("unexpected error: {other:?}"),
        }
    }
    assert!(!client.is_authenticated());
    assert_eq!(calls_to(&mock_server, "/projects").await, 2);
    assert_eq!(client.refresh_phase(), RefreshPhase::Idle);
}

#[tokio::test]
async fn test_replayed_rejection_is_terminal() {
    let mock_server = MockServer::start().await;

    // Permission revoked: every token is refused
    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "statusCode": 401,
            "message": "Account suspended"
        })))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_refresh(&mock_server, issued("fresh", "r2"), 1).await;

    let client = client_for(&mock_server);
    match client.list_projects().await.unwrap_err() {
        ApiError::Authentication { message } => assert_eq!(message, "Account suspended"),
        other => panic!("unexpected error: {other:?}"),
    }

    // The refreshed pair is kept; only the request failed
    assert_eq!(client.credentials(), Some(CredentialPair::new("fresh", "r2")));
}

#[tokio::test]
async fn test_slow_refresh_times_out() {
    let mock_server = MockServer::start().await;
    mount_projects(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(issued("fresh", "r2").set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let client = ClientBuilder::default()
        .base_url(mock_server.uri())
        .with_tokens("stale", "r1")
        .refresh_timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = client.list_projects().await.unwrap_err();

    assert!(matches!(err, ApiError::RefreshExchange(RefreshError::TimedOut)));
    assert!(err.requires_login());
    assert!(!client.is_authenticated());
    assert_eq!(client.refresh_phase(), RefreshPhase::Idle);
}

#[tokio::test]
async fn test_refreshed_pair_is_persisted() {
    let mock_server = MockServer::start().await;
    mount_projects(&mock_server).await;
    mount_refresh(&mock_server, issued("fresh", "r2"), 1).await;

    let dir = tempfile::tempdir().unwrap();
    let credentials_path = dir.path().join("credentials.json");

    let client = ClientBuilder::default()
        .base_url(mock_server.uri())
        .with_credentials_path(&credentials_path)
        .with_tokens("stale", "r1")
        .build()
        .unwrap();
    client.list_projects().await.unwrap();

    let stored: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&credentials_path).unwrap()).unwrap();
    assert_eq!(stored, json!({ "accessToken": "fresh", "refreshToken": "r2" }));

    client.logout();
    let stored: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&credentials_path).unwrap()).unwrap();
    assert_eq!(stored, json!({}));
}

#[tokio::test]
async fn test_login_then_checkout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "fresh",
            "refreshToken": "r1",
            "user": { "id": "u1", "email": "client@example.com", "name": "Client", "role": "CLIENT" }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/payments/checkout"))
        .and(header("Authorization", "Bearer fresh"))
        .and(body_json(json!({ "invoiceId": "inv_1", "provider": "STRIPE" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sessionId": "cs_test_1",
            "paymentUrl": "https://checkout.stripe.com/c/pay/cs_test_1",
            "provider": "STRIPE",
            "expiresAt": "2024-02-01T01:00:00.000Z"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ClientBuilder::default()
        .base_url(mock_server.uri())
        .build()
        .unwrap();
    client.login("client@example.com", "hunter2").await.unwrap();

    let mut request = abel_sdk::CreateCheckoutRequest::new("inv_1");
    request.provider = Some(abel_sdk::PaymentProvider::Stripe);
    let session = client.create_checkout(&request).await.unwrap();

    assert_eq!(session.session_id, "cs_test_1");
    assert!(session.expires_at.is_some());
}
