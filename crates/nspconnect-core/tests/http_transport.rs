//! End-to-end tests of the reqwest transport against a mock NSP.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{basic_auth, bearer_token, body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nspconnect_core::endpoints::{
    intent_type_path, AUTH_REVOKE_PATH, AUTH_TOKEN_PATH, SEARCH_INTENT_TYPES_PATH,
};
use nspconnect_core::{
    Config, Credentials, ErrorCategory, HttpTransport, IntentCatalog, NspError, SessionManager,
    TransportError,
};

fn plain_http_config() -> Config {
    Config {
        scheme: "http".to_string(),
        accept_invalid_certs: false,
        ..Config::default()
    }
}

async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(AUTH_TOKEN_PATH))
        .and(basic_auth("admin", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "refresh_token": "refresh",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
}

fn session_for(config: &Config) -> Arc<SessionManager> {
    let transport = HttpTransport::from_config(config).expect("client builds");
    Arc::new(SessionManager::new(Arc::new(transport)).with_renewal_margin(config.renewal_margin()))
}

#[tokio::test]
async fn test_connect_search_fetch_disconnect() {
    let server = MockServer::start().await;
    let host = server.address().to_string();
    mount_token(&server, "tkn-abc").await;

    Mock::given(method("POST"))
        .and(path(SEARCH_INTENT_TYPES_PATH))
        .and(bearer_token("tkn-abc"))
        .and(body_json(json!({"ibn-administration:input": {"page-number": 0, "page-size": 2}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ibn-administration:output": {
                "page-size": 2,
                "total-count": 3,
                "intent-type": [
                    {"name": "l3vpn", "version": 1},
                    {"name": "elan", "version": 2}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEARCH_INTENT_TYPES_PATH))
        .and(bearer_token("tkn-abc"))
        .and(body_json(json!({"ibn-administration:input": {"page-number": 1, "page-size": 2}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ibn-administration:output": {
                "page-size": 2,
                "total-count": 3,
                "intent-type": [{"name": "port_config", "version": 7}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(intent_type_path("l3vpn", 1)))
        .and(bearer_token("tkn-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ibn-administration:intent-type": {
                "name": "l3vpn",
                "version": 1,
                "module": [{"name": "l3vpn.yang", "yang-content": "module l3vpn { }"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(AUTH_REVOKE_PATH))
        .and(basic_auth("admin", "secret"))
        .and(body_string_contains("token=tkn-abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = plain_http_config();
    let session = session_for(&config);
    let catalog = IntentCatalog::new(session.clone());

    session
        .connect(Credentials::new(host.clone(), "admin", "secret"))
        .await
        .unwrap();
    assert_eq!(session.status().await.unwrap().host, host);

    let keys: Vec<String> = catalog
        .search_intent_types(2)
        .await
        .unwrap()
        .iter()
        .map(|k| k.to_string())
        .collect();
    assert_eq!(keys, vec!["l3vpn_1", "elan_2", "port_config_7"]);

    let modules = catalog.fetch_modules("l3vpn_1").await.unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].yang_content, "module l3vpn { }");

    session.disconnect().await.unwrap();
    assert!(!session.is_connected().await);
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AUTH_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let session = session_for(&plain_http_config());
    let err = session
        .connect(Credentials::new(server.address().to_string(), "admin", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, NspError::Auth(_)));
    assert_eq!(err.category(), ErrorCategory::BadCredentials);
    assert!(!session.is_connected().await);
}

#[tokio::test]
async fn test_malformed_auth_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AUTH_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let session = session_for(&plain_http_config());
    let err = session
        .connect(Credentials::new(server.address().to_string(), "admin", "secret"))
        .await
        .unwrap_err();

    assert!(matches!(err, NspError::Auth(_)));
}

#[tokio::test]
async fn test_upstream_error_status_is_transport_error() {
    let server = MockServer::start().await;
    mount_token(&server, "tkn-1").await;
    Mock::given(method("POST"))
        .and(path(SEARCH_INTENT_TYPES_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let session = session_for(&plain_http_config());
    let catalog = IntentCatalog::new(session.clone());
    session
        .connect(Credentials::new(server.address().to_string(), "admin", "secret"))
        .await
        .unwrap();

    let err = catalog.search_intent_types(10).await.unwrap_err();
    assert_eq!(
        err,
        NspError::Transport(TransportError::Status {
            status: 503,
            body: "maintenance".into()
        })
    );
    assert_eq!(err.category(), ErrorCategory::Upstream);
}

#[tokio::test]
async fn test_unreachable_host() {
    // Nothing listens on the discard port
    let session = session_for(&plain_http_config());
    let err = session
        .connect(Credentials::new("127.0.0.1:9", "admin", "secret"))
        .await
        .unwrap_err();

    assert!(matches!(err, NspError::Transport(_)));
}
