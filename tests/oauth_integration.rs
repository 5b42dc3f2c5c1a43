//! OAuth 2.0 Integration Tests
//!
//! These tests exercise the complete flows over HTTP: authorization code
//! grant, client credentials grant, introspection, revocation, and the
//! protected tool-document endpoints.

use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;

use toolgate::config::Config;
use toolgate::http::{AppState, build_router};
use toolgate::oauth::{
    AuthorizationCode, AuthorizationCodeStore, AuthorizationServer, Client,
    ClientProvisioningService, ClientStore, GrantType, JwtTokenCodec, MemoryOAuthStorage,
    Principal, PrincipalStore, TokenClaims, TokenCodec, generate_token,
};
use toolgate::tools::StaticToolDocumentProvider;

const SIGNING_SECRET: &[u8] = b"integration-test-signing-secret";
const TEST_BCRYPT_COST: u32 = 4;

struct TestHarness {
    server: TestServer,
    storage: Arc<MemoryOAuthStorage>,
    codec: Arc<JwtTokenCodec>,
}

fn test_config() -> Config {
    Config {
        version: "test".to_string(),
        http_port: "3000".to_string().try_into().unwrap(),
        external_base: "https://localhost".to_string(),
        token_signing_secret: String::from_utf8(SIGNING_SECRET.to_vec())
            .unwrap()
            .try_into()
            .unwrap(),
        access_token_expiration: "30m".to_string().try_into().unwrap(),
        auth_code_expiration: "10m".to_string().try_into().unwrap(),
        default_scope: "read:tools".to_string().try_into().unwrap(),
        client_secret_hash_cost: "4".to_string().try_into().unwrap(),
        storage_backend: "memory".to_string(),
        database_url: None,
    }
}

async fn test_harness() -> TestHarness {
    let storage = Arc::new(MemoryOAuthStorage::new());
    let codec = Arc::new(JwtTokenCodec::new(SIGNING_SECRET));

    let auth_server = Arc::new(AuthorizationServer::new(
        storage.clone(),
        codec.clone(),
        Duration::minutes(30),
        Duration::minutes(10),
        "read:tools".to_string(),
    ));
    let state = AppState {
        config: Arc::new(test_config()),
        oauth_storage: storage.clone(),
        auth_server,
        token_codec: codec.clone(),
        tool_documents: Arc::new(StaticToolDocumentProvider),
    };

    let server = TestServer::new(build_router(state)).unwrap();
    TestHarness {
        server,
        storage,
        codec,
    }
}

/// Register a principal and a client with a known secret, returning the
/// cleartext secret
async fn seed_client(storage: &MemoryOAuthStorage, principal_id: i64, name: &str) -> String {
    storage
        .store_principal(&Principal {
            id: principal_id,
            name: name.to_string(),
        })
        .await
        .unwrap();

    let secret = generate_token();
    storage
        .store_client(&Client {
            client_id: format!("toolgate-user-{principal_id}"),
            secret_hash: bcrypt::hash(&secret, TEST_BCRYPT_COST).unwrap(),
            client_name: format!("{name} OAuth Client"),
            redirect_uris: vec!["https://app.example.com/callback".to_string()],
            grant_types: vec![GrantType::AuthorizationCode, GrantType::ClientCredentials],
            principal_id,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    secret
}

fn code_from_location(location: &str) -> String {
    let url = url::Url::parse(location).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.to_string())
        .expect("authorization code not found in redirect")
}

#[tokio::test]
async fn test_complete_authorization_code_flow() {
    let harness = test_harness().await;
    let secret = seed_client(&harness.storage, 1, "Alice").await;

    // Step 1: authorization request redirects with code and state
    let response = harness
        .server
        .get("/oauth/authorize")
        .add_query_param("response_type", "code")
        .add_query_param("client_id", "toolgate-user-1")
        .add_query_param("redirect_uri", "https://app.example.com/callback")
        .add_query_param("state", "random-state-string")
        .await;

    response.assert_status(http::StatusCode::FOUND);
    let location = response.header("location");
    let location = location.to_str().unwrap();
    assert!(location.starts_with("https://app.example.com/callback?"));
    assert!(location.contains("state=random-state-string"));
    let code = code_from_location(location);

    // Step 2: token exchange succeeds
    let response = harness
        .server
        .post("/oauth/token")
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", "https://app.example.com/callback"),
            ("client_id", "toolgate-user-1"),
            ("client_secret", secret.as_str()),
        ])
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 30 * 60);
    assert_eq!(body["scope"], "read:tools");
    let access_token = body["access_token"].as_str().unwrap().to_string();

    // Step 3: re-posting the same code fails with invalid_grant
    let response = harness
        .server
        .post("/oauth/token")
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", "https://app.example.com/callback"),
            ("client_id", "toolgate-user-1"),
            ("client_secret", secret.as_str()),
        ])
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_grant");

    // Step 4: token claims carry the code's bound principal and client
    let claims: TokenClaims = harness.codec.verify(&access_token).unwrap();
    assert_eq!(claims.sub, "1");
    assert_eq!(claims.client_id, "toolgate-user-1");
    assert_eq!(claims.scope, "read:tools");
}

#[tokio::test]
async fn test_client_credentials_flow_and_resource_access() {
    let harness = test_harness().await;
    let secret = seed_client(&harness.storage, 2, "Bob").await;

    let response = harness
        .server
        .post("/oauth/token")
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", "toolgate-user-2"),
            ("client_secret", secret.as_str()),
            ("scope", "read:tools"),
        ])
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let access_token = body["access_token"].as_str().unwrap().to_string();

    // The token opens the subject's own tool document
    let response = harness
        .server
        .get("/api/users/me/external-tools")
        .authorization_bearer(&access_token)
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("Bob"));

    let response = harness
        .server
        .get("/api/users/2/external-tools")
        .authorization_bearer(&access_token)
        .await;
    response.assert_status_ok();

    // Another principal's document is forbidden
    let response = harness
        .server
        .get("/api/users/3/external-tools")
        .authorization_bearer(&access_token)
        .await;
    response.assert_status(http::StatusCode::FORBIDDEN);

    // Client metadata endpoint returns no secret material
    let response = harness
        .server
        .get("/api/oauth/clients/me")
        .authorization_bearer(&access_token)
        .await;
    response.assert_status_ok();
    let clients: Value = response.json();
    assert_eq!(clients[0]["client_id"], "toolgate-user-2");
    assert!(clients[0].get("secret_hash").is_none());
}

#[tokio::test]
async fn test_authorize_rejects_unlisted_redirect_without_redirecting() {
    let harness = test_harness().await;
    seed_client(&harness.storage, 1, "Alice").await;

    let response = harness
        .server
        .get("/oauth/authorize")
        .add_query_param("response_type", "code")
        .add_query_param("client_id", "toolgate-user-1")
        .add_query_param("redirect_uri", "https://evil.example.com/steal")
        .await;

    response.assert_status_bad_request();
    assert!(response.maybe_header("location").is_none());
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_expired_code_rejected() {
    let harness = test_harness().await;
    let secret = seed_client(&harness.storage, 1, "Alice").await;

    let now = Utc::now();
    harness
        .storage
        .store_code(&AuthorizationCode {
            code: "stale-code".to_string(),
            client_id: "toolgate-user-1".to_string(),
            principal_id: 1,
            redirect_uri: "https://app.example.com/callback".to_string(),
            scope: "read:tools".to_string(),
            created_at: now - Duration::minutes(11),
            expires_at: now - Duration::minutes(1),
            used: false,
        })
        .await
        .unwrap();

    let response = harness
        .server
        .post("/oauth/token")
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", "stale-code"),
            ("redirect_uri", "https://app.example.com/callback"),
            ("client_id", "toolgate-user-1"),
            ("client_secret", secret.as_str()),
        ])
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn test_uniform_client_authentication_failures() {
    let harness = test_harness().await;
    seed_client(&harness.storage, 1, "Alice").await;

    let unknown = harness
        .server
        .post("/oauth/token")
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", "no-such-client"),
            ("client_secret", "whatever"),
        ])
        .await;

    let wrong_secret = harness
        .server
        .post("/oauth/token")
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", "toolgate-user-1"),
            ("client_secret", "not-the-secret"),
        ])
        .await;

    unknown.assert_status_unauthorized();
    wrong_secret.assert_status_unauthorized();

    // Identical bodies: the response never reveals whether the client exists
    let unknown_body: Value = unknown.json();
    let wrong_secret_body: Value = wrong_secret.json();
    assert_eq!(unknown_body, wrong_secret_body);
    assert_eq!(unknown_body["error"], "invalid_client");
}

#[tokio::test]
async fn test_unsupported_grant_and_response_types() {
    let harness = test_harness().await;
    let secret = seed_client(&harness.storage, 1, "Alice").await;

    let response = harness
        .server
        .post("/oauth/token")
        .form(&[
            ("grant_type", "password"),
            ("client_id", "toolgate-user-1"),
            ("client_secret", secret.as_str()),
        ])
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "unsupported_grant_type");

    let response = harness
        .server
        .get("/oauth/authorize")
        .add_query_param("response_type", "token")
        .add_query_param("client_id", "toolgate-user-1")
        .add_query_param("redirect_uri", "https://app.example.com/callback")
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "unsupported_response_type");
}

#[tokio::test]
async fn test_authorize_missing_parameters_get_oauth_error_body() {
    let harness = test_harness().await;
    seed_client(&harness.storage, 1, "Alice").await;

    // client_id omitted entirely
    let response = harness
        .server
        .get("/oauth/authorize")
        .add_query_param("response_type", "code")
        .add_query_param("redirect_uri", "https://app.example.com/callback")
        .await;
    response.assert_status_bad_request();
    assert!(response.maybe_header("location").is_none());
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_request");

    // No parameters at all
    let response = harness.server.get("/oauth/authorize").await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_introspection_lifecycle_with_revocation() {
    let harness = test_harness().await;
    let secret = seed_client(&harness.storage, 1, "Alice").await;

    let response = harness
        .server
        .post("/oauth/token")
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", "toolgate-user-1"),
            ("client_secret", secret.as_str()),
        ])
        .await;
    let access_token = response.json::<Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    // Active before revocation
    let response = harness
        .server
        .post("/oauth/introspect")
        .form(&[
            ("token", access_token.as_str()),
            ("client_id", "toolgate-user-1"),
            ("client_secret", secret.as_str()),
        ])
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["active"], true);
    assert_eq!(body["client_id"], "toolgate-user-1");
    assert_eq!(body["sub"], "1");
    assert_eq!(body["scope"], "read:tools");

    // Revoke, then introspection reports inactive
    let response = harness
        .server
        .post("/oauth/revoke")
        .form(&[
            ("token", access_token.as_str()),
            ("client_id", "toolgate-user-1"),
            ("client_secret", secret.as_str()),
        ])
        .await;
    response.assert_status_ok();

    let response = harness
        .server
        .post("/oauth/introspect")
        .form(&[
            ("token", access_token.as_str()),
            ("client_id", "toolgate-user-1"),
            ("client_secret", secret.as_str()),
        ])
        .await;
    let body: Value = response.json();
    assert_eq!(body["active"], false);
    assert!(body.get("client_id").is_none());

    // The resource gate checks signature and expiry only, so the revoked
    // token still opens the document until it expires
    let response = harness
        .server
        .get("/api/users/me/external-tools")
        .authorization_bearer(&access_token)
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_introspection_rejects_forged_and_unknown_tokens() {
    let harness = test_harness().await;
    let secret = seed_client(&harness.storage, 1, "Alice").await;

    // Signed with the right key but never issued: no hash in the store
    let claims = JwtTokenCodec::claims_for(1, "toolgate-user-1", "read:tools", Duration::minutes(30));
    let unissued = harness.codec.sign(&claims).unwrap();

    let response = harness
        .server
        .post("/oauth/introspect")
        .form(&[
            ("token", unissued.as_str()),
            ("client_id", "toolgate-user-1"),
            ("client_secret", secret.as_str()),
        ])
        .await;
    let body: Value = response.json();
    assert_eq!(body["active"], false);

    // Signed with the wrong key
    let forger = JwtTokenCodec::new(b"some-other-key-entirely-here");
    let forged = forger.sign(&claims).unwrap();

    let response = harness
        .server
        .post("/oauth/introspect")
        .form(&[
            ("token", forged.as_str()),
            ("client_id", "toolgate-user-1"),
            ("client_secret", secret.as_str()),
        ])
        .await;
    let body: Value = response.json();
    assert_eq!(body["active"], false);

    // Introspection itself requires client authentication
    let response = harness
        .server
        .post("/oauth/introspect")
        .form(&[
            ("token", unissued.as_str()),
            ("client_id", "toolgate-user-1"),
            ("client_secret", "wrong"),
        ])
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_resource_gate_challenges_bad_tokens() {
    let harness = test_harness().await;
    seed_client(&harness.storage, 1, "Alice").await;

    // No token
    let response = harness.server.get("/api/users/me/external-tools").await;
    response.assert_status_unauthorized();
    assert_eq!(
        response.header("www-authenticate").to_str().unwrap(),
        "Bearer"
    );

    // Expired token
    let mut claims =
        JwtTokenCodec::claims_for(1, "toolgate-user-1", "read:tools", Duration::minutes(30));
    claims.iat = (Utc::now() - Duration::minutes(31)).timestamp();
    claims.exp = (Utc::now() - Duration::minutes(1)).timestamp();
    let expired = harness.codec.sign(&claims).unwrap();

    let response = harness
        .server
        .get("/api/users/me/external-tools")
        .authorization_bearer(&expired)
        .await;
    response.assert_status_unauthorized();

    // Garbage token
    let response = harness
        .server
        .get("/api/users/me/external-tools")
        .authorization_bearer("not-a-token")
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_concurrent_code_redemption_over_http() {
    use futures::future::join_all;

    let harness = test_harness().await;
    let secret = seed_client(&harness.storage, 1, "Alice").await;
    let harness = Arc::new(harness);

    let response = harness
        .server
        .get("/oauth/authorize")
        .add_query_param("response_type", "code")
        .add_query_param("client_id", "toolgate-user-1")
        .add_query_param("redirect_uri", "https://app.example.com/callback")
        .await;
    let code = code_from_location(response.header("location").to_str().unwrap());

    let attempts = (0..8).map(|_| {
        let harness = harness.clone();
        let code = code.clone();
        let secret = secret.clone();
        async move {
            harness
                .server
                .post("/oauth/token")
                .form(&[
                    ("grant_type", "authorization_code"),
                    ("code", code.as_str()),
                    ("redirect_uri", "https://app.example.com/callback"),
                    ("client_id", "toolgate-user-1"),
                    ("client_secret", secret.as_str()),
                ])
                .await
                .status_code()
        }
    });

    let statuses = join_all(attempts).await;
    let successes = statuses
        .iter()
        .filter(|s| **s == http::StatusCode::OK)
        .count();
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_provisioning_then_full_flow() {
    let harness = test_harness().await;

    harness
        .storage
        .store_principal(&Principal {
            id: 9,
            name: "Ivy".to_string(),
        })
        .await
        .unwrap();

    let provisioning = ClientProvisioningService::new(harness.storage.clone(), TEST_BCRYPT_COST);
    let provisioned = provisioning
        .register(&Principal {
            id: 9,
            name: "Ivy".to_string(),
        })
        .await
        .unwrap();
    let secret = provisioned.secret.unwrap();

    // The provisioned client can complete the client_credentials flow
    let response = harness
        .server
        .post("/oauth/token")
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", "toolgate-user-9"),
            ("client_secret", secret.as_str()),
        ])
        .await;
    response.assert_status_ok();

    let access_token = response.json::<Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    let response = harness
        .server
        .get("/api/users/9/external-tools")
        .authorization_bearer(&access_token)
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("Ivy"));
}

#[tokio::test]
async fn test_index_lists_endpoints() {
    let harness = test_harness().await;

    let response = harness.server.get("/").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["authorization_endpoint"], "/oauth/authorize");
    assert_eq!(body["token_endpoint"], "/oauth/token");
    assert_eq!(body["introspection_endpoint"], "/oauth/introspect");
    assert_eq!(body["revocation_endpoint"], "/oauth/revoke");
}
