//! Integration tests for the provisioning workflow against a mock gateway.
//!
//! wiremock stands in for the MoMo sandbox; the server tests bind the real
//! hyper server on an ephemeral port and drive it with reqwest.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, header_exists, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use momo_keygen::config::Args;
use momo_keygen::provisioning::{
    CredentialAssembler, CredentialRegistrar, CredentialRequest, NoopObserver,
    ProvisioningOutcome, ProvisioningService, RegistrarConfig, RemoteFailure, RemoteRegistrar,
};
use momo_keygen::server::{self, AppState};

// =============================================================================
// Test Helpers
// =============================================================================

const KEY_PATH: &str = r"^/v1_0/apiuser/[0-9a-f-]{36}/apikey$";

fn registrar_for(base_url: &str, timeout: Duration) -> Arc<RemoteRegistrar> {
    Arc::new(
        RemoteRegistrar::new(RegistrarConfig {
            base_url: base_url.to_string(),
            request_timeout: timeout,
        })
        .unwrap(),
    )
}

fn service_for(registrar: Arc<dyn CredentialRegistrar>, gateway: &str) -> ProvisioningService {
    ProvisioningService::new(
        registrar,
        Arc::new(NoopObserver),
        CredentialAssembler::new(gateway),
        "example.com",
    )
}

fn sk_request(callback_host: &str) -> CredentialRequest {
    CredentialRequest {
        subscription_key: Some("sk-123".to_string()),
        callback_host: Some(callback_host.to_string()),
        secondary_key: None,
    }
}

async fn mount_user_created(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1_0/apiuser"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
}

fn is_lower_hex_32(value: &str) -> bool {
    value.len() == 32 && value.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

fn decode_auth(value: &str) -> String {
    String::from_utf8(STANDARD.decode(value).unwrap()).unwrap()
}

// =============================================================================
// Registrar Protocol Tests
// =============================================================================

#[tokio::test]
async fn test_register_identity_sends_headers_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_0/apiuser"))
        .and(header("Ocp-Apim-Subscription-Key", "sk-123"))
        .and(header("Content-Type", "application/json"))
        .and(header_exists("X-Reference-Id"))
        .and(body_json(json!({ "providerCallbackHost": "webhook.merchant.test" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let registrar = registrar_for(&server.uri(), Duration::from_secs(5));
    let identifier = registrar
        .register_identity("sk-123", "webhook.merchant.test")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let reference_id = requests[0]
        .headers
        .get("X-Reference-Id")
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(reference_id, identifier);
    assert_eq!(uuid::Uuid::parse_str(&identifier).unwrap().get_version_num(), 4);
}

#[tokio::test]
async fn test_register_identity_requires_created() {
    let server = MockServer::start().await;

    // 200 is still not "created"
    Mock::given(method("POST"))
        .and(path("/v1_0/apiuser"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let registrar = registrar_for(&server.uri(), Duration::from_secs(5));
    let err = registrar
        .register_identity("sk-123", "example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteFailure::UnexpectedStatus { .. }));
}

#[tokio::test]
async fn test_register_key_parses_api_key() {
    let server = MockServer::start().await;
    let identifier = "11111111-1111-1111-1111-111111111111";

    Mock::given(method("POST"))
        .and(path(format!("/v1_0/apiuser/{}/apikey", identifier)))
        .and(header("Ocp-Apim-Subscription-Key", "sk-123"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "apiKey": "abc123" })))
        .expect(1)
        .mount(&server)
        .await;

    let registrar = registrar_for(&server.uri(), Duration::from_secs(5));
    let key = registrar.register_key("sk-123", identifier).await.unwrap();
    assert_eq!(key, "abc123");
}

#[tokio::test]
async fn test_register_key_missing_field_is_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(KEY_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "key": "abc123" })))
        .mount(&server)
        .await;

    let registrar = registrar_for(&server.uri(), Duration::from_secs(5));
    let err = registrar
        .register_key("sk-123", "11111111-1111-1111-1111-111111111111")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteFailure::MalformedBody(_)));
}

#[tokio::test]
async fn test_slow_gateway_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_0/apiuser"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let registrar = registrar_for(&server.uri(), Duration::from_millis(100));
    let err = registrar
        .register_identity("sk-123", "example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteFailure::Timeout(_)));
}

// =============================================================================
// Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_both_steps_created_yields_registered_bundle() {
    let server = MockServer::start().await;
    mount_user_created(&server).await;
    Mock::given(method("POST"))
        .and(path_regex(KEY_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "apiKey": "abc123" })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(
        registrar_for(&server.uri(), Duration::from_secs(5)),
        &server.uri(),
    );
    let provisioned = service.generate_credentials(sk_request("")).await.unwrap();
    let bundle = &provisioned.bundle;

    assert!(provisioned.registered);
    assert!(provisioned.message.contains("successfully created and registered"));
    assert_eq!(bundle.api_key, "abc123");
    assert_eq!(bundle.api_user, bundle.user_id);
    assert_eq!(bundle.callback_host, "example.com");
    assert_eq!(decode_auth(&bundle.base64_auth), format!("{}:abc123", bundle.api_user));

    let command = bundle.test_command.as_deref().unwrap();
    assert!(command.contains(&bundle.base64_auth));
    assert!(command.contains("sk-123"));

    // The key was requested for the same reference id the user was created with
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].url.path(),
        format!("/v1_0/apiuser/{}/apikey", bundle.api_user)
    );
}

#[tokio::test]
async fn test_identity_rejected_skips_key_and_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_0/apiuser"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "statusCode": 401, "message": "Access denied" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(KEY_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "apiKey": "abc123" })))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(
        registrar_for(&server.uri(), Duration::from_secs(5)),
        &server.uri(),
    );
    let provisioned = service
        .generate_credentials(sk_request("webhook.merchant.test"))
        .await
        .unwrap();

    assert!(!provisioned.registered);
    assert!(provisioned.message.contains("locally"));
    assert!(provisioned.bundle.test_command.is_none());
    assert!(is_lower_hex_32(&provisioned.bundle.api_key));
    assert_eq!(provisioned.bundle.callback_host, "webhook.merchant.test");
}

#[tokio::test]
async fn test_key_step_failure_regenerates_both_values() {
    let server = MockServer::start().await;
    mount_user_created(&server).await;
    Mock::given(method("POST"))
        .and(path_regex(KEY_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(
        registrar_for(&server.uri(), Duration::from_secs(5)),
        &server.uri(),
    );
    let provisioned = service.generate_credentials(sk_request("")).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let remote_id = requests[0]
        .headers
        .get("X-Reference-Id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    assert!(!provisioned.registered);
    assert_ne!(provisioned.bundle.api_user, remote_id);
    assert!(is_lower_hex_32(&provisioned.bundle.api_key));
    assert!(provisioned.bundle.test_command.is_none());
}

#[tokio::test]
async fn test_unreachable_gateway_scenario() {
    let service = service_for(
        registrar_for("http://127.0.0.1:1", Duration::from_secs(2)),
        "http://127.0.0.1:1",
    );
    let provisioned = service.generate_credentials(sk_request("")).await.unwrap();
    let bundle = &provisioned.bundle;

    assert_eq!(bundle.callback_host, "example.com");
    assert_eq!(bundle.target_environment, "sandbox");
    assert!(bundle.test_command.is_none());
    assert!(provisioned.message.contains("locally"));
    assert!(is_lower_hex_32(&bundle.api_key));
    assert!(uuid::Uuid::parse_str(&bundle.api_user).is_ok());
    assert_eq!(decode_auth(&bundle.base64_auth), format!("{}:{}", bundle.api_user, bundle.api_key));
}

/// Registrar returning the fixed pair from the reference scenario
struct FixedPairRegistrar;

#[async_trait::async_trait]
impl CredentialRegistrar for FixedPairRegistrar {
    async fn register_identity(&self, _: &str, _: &str) -> Result<String, RemoteFailure> {
        Ok("11111111-1111-1111-1111-111111111111".to_string())
    }

    async fn register_key(&self, _: &str, _: &str) -> Result<String, RemoteFailure> {
        Ok("abc123".to_string())
    }
}

#[tokio::test]
async fn test_fixed_pair_scenario() {
    let service = service_for(
        Arc::new(FixedPairRegistrar),
        "https://sandbox.momodeveloper.mtn.com",
    );
    let provisioned = service.generate_credentials(sk_request("")).await.unwrap();

    let expected = STANDARD.encode("11111111-1111-1111-1111-111111111111:abc123");
    assert_eq!(provisioned.bundle.base64_auth, expected);
    let command = provisioned.bundle.test_command.unwrap();
    assert!(command.contains(&expected));
    assert!(command.contains("sk-123"));

    let outcome = ProvisioningOutcome::Registered {
        identifier: "11111111-1111-1111-1111-111111111111".to_string(),
        key: "abc123".to_string(),
    };
    assert_eq!(provisioned.message, outcome.message());
}

#[tokio::test]
async fn test_repeated_requests_never_repeat_credentials() {
    let service = service_for(
        registrar_for("http://127.0.0.1:1", Duration::from_secs(2)),
        "http://127.0.0.1:1",
    );
    let first = service.generate_credentials(sk_request("")).await.unwrap();
    let second = service.generate_credentials(sk_request("")).await.unwrap();

    assert_ne!(first.bundle.api_user, second.bundle.api_user);
    assert_ne!(first.bundle.api_key, second.bundle.api_key);
}

// =============================================================================
// HTTP Server Tests
// =============================================================================

async fn spawn_server(gateway_url: &str) -> String {
    let args = Args {
        gateway_url: gateway_url.to_string(),
        request_timeout_ms: 2_000,
        ..Default::default()
    };
    let state = Arc::new(AppState::new(args).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, state));

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_server_generate_registered() {
    let gateway = MockServer::start().await;
    mount_user_created(&gateway).await;
    Mock::given(method("POST"))
        .and(path_regex(KEY_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "apiKey": "abc123" })))
        .mount(&gateway)
        .await;

    let base = spawn_server(&gateway.uri()).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .header("Origin", "http://localhost:3000")
        .json(&json!({ "primaryKey": "sk-123", "secondaryKey": "ignored", "callbackHost": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["apiKey"], "abc123");
    assert_eq!(body["data"]["targetEnvironment"], "sandbox");
    assert_eq!(body["data"]["callbackHost"], "example.com");
    assert!(body["data"]["testCommand"].is_string());
}

#[tokio::test]
async fn test_server_missing_key_is_client_error() {
    let base = spawn_server("http://127.0.0.1:1").await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .json(&json!({ "callbackHost": "webhook.merchant.test" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_server_fallback_is_still_created() {
    let base = spawn_server("http://127.0.0.1:1").await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .json(&json!({ "primaryKey": "sk-123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("locally"));
    assert!(body["data"].get("testCommand").is_none());
}

#[tokio::test]
async fn test_server_routing_edges() {
    let base = spawn_server("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();

    let wrong_method = client
        .get(format!("{}/api/generate", base))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_method.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

    let preflight = client
        .request(reqwest::Method::OPTIONS, format!("{}/api/generate", base))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();
    assert_eq!(preflight.status(), reqwest::StatusCode::NO_CONTENT);
    assert_eq!(
        preflight
            .headers()
            .get("access-control-allow-credentials")
            .unwrap(),
        "true"
    );

    let foreign_preflight = client
        .request(reqwest::Method::OPTIONS, format!("{}/api/generate", base))
        .header("Origin", "https://evil.test")
        .send()
        .await
        .unwrap();
    assert_eq!(foreign_preflight.status(), reqwest::StatusCode::FORBIDDEN);

    let missing = client.get(format!("{}/nope", base)).send().await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let health = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(health.status(), reqwest::StatusCode::OK);
}
