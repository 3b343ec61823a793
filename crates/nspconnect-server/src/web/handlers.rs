// Request handlers: translate HTTP calls into session and catalog operations

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::warn;

use nspconnect_core::{Credentials, ErrorCategory, NspError, YangModule};

use crate::web::AppState;

/// Plain-text error reply carrying what failed and why.
#[derive(Debug)]
pub struct HandlerError {
    status: StatusCode,
    message: String,
}

impl HandlerError {
    fn new(context: &str, err: NspError) -> Self {
        let status = match err.category() {
            ErrorCategory::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCategory::BadCredentials => StatusCode::UNAUTHORIZED,
            ErrorCategory::NotConnected => StatusCode::CONFLICT,
            ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: format!("{} / {}", context, err),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, message = %self.message, "Request failed");
        (self.status, self.message).into_response()
    }
}

type HandlerResult<T> = Result<T, HandlerError>;

#[derive(Serialize)]
pub struct NspAccessExport {
    pub ip: String,
    pub user: String,
}

#[derive(Serialize)]
pub struct ListEntry {
    pub name: String,
}

pub async fn ping() -> &'static str {
    "Backend active"
}

pub async fn nsp_connect(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> HandlerResult<&'static str> {
    let Json(credentials) = payload.map_err(|e| {
        HandlerError::bad_request(format!("decoding NSP connect request failed / {}", e))
    })?;

    state
        .session
        .connect(credentials)
        .await
        .map_err(|e| HandlerError::new("error making NSP connection", e))?;

    Ok("NSP connected")
}

pub async fn nsp_disconnect(State(state): State<AppState>) -> HandlerResult<&'static str> {
    let host = state.session.status().await.map(|s| s.host).unwrap_or_default();
    state
        .session
        .disconnect()
        .await
        .map_err(|e| HandlerError::new(&format!("disconnecting from NSP ({}) failed", host), e))?;

    Ok("NSP disconnected")
}

pub async fn nsp_status(State(state): State<AppState>) -> HandlerResult<Json<NspAccessExport>> {
    let status = state
        .session
        .status()
        .await
        .map_err(|e| HandlerError::new("NSP status unavailable", e))?;

    Ok(Json(NspAccessExport {
        ip: status.host,
        user: status.user,
    }))
}

pub async fn list(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> HandlerResult<Json<Vec<ListEntry>>> {
    if kind != "nsp" {
        return Err(HandlerError::bad_request("unsupported kind"));
    }

    let keys = state
        .catalog
        .list_intent_types()
        .await
        .map_err(|e| HandlerError::new("fetching NSP intent types failed", e))?;

    Ok(Json(
        keys.into_iter()
            .map(|key| ListEntry {
                name: key.to_string(),
            })
            .collect(),
    ))
}

pub async fn intent_type_modules(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> HandlerResult<Json<Vec<YangModule>>> {
    let modules = state
        .catalog
        .fetch_modules(&key)
        .await
        .map_err(|e| HandlerError::new("error fetching YANG modules", e))?;

    Ok(Json(modules))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    use nspconnect_core::testing::ScriptedTransport;
    use nspconnect_core::{IntentCatalog, SessionManager};

    use crate::web::server::create_router;
    use crate::web::AppState;

    fn app(transport: &Arc<ScriptedTransport>) -> (axum::Router, Arc<SessionManager>) {
        let session = Arc::new(SessionManager::new(transport.clone()));
        let catalog = Arc::new(IntentCatalog::new(session.clone()).with_default_page_size(2));
        (create_router(AppState::new(session.clone(), catalog)), session)
    }

    async fn call(router: &axum::Router, method: Method, uri: &str, body: Option<&str>) -> (u16, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    const CONNECT_BODY: &str = r#"{"ip":"nsp.lab","user":"admin","pass":"secret"}"#;

    #[tokio::test]
    async fn test_ping() {
        let (router, _) = app(&Arc::new(ScriptedTransport::new()));
        assert_eq!(
            call(&router, Method::GET, "/api/ping", None).await,
            (200, "Backend active".to_string())
        );
    }

    #[tokio::test]
    async fn test_connect_status_disconnect() {
        let transport = Arc::new(ScriptedTransport::new());
        let (router, session) = app(&transport);

        let (status, body) = call(&router, Method::POST, "/api/nsp/connect", Some(CONNECT_BODY)).await;
        assert_eq!((status, body.as_str()), (200, "NSP connected"));
        assert!(session.is_connected().await);

        let (status, body) = call(&router, Method::GET, "/api/nsp/status", None).await;
        assert_eq!(status, 200);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json, serde_json::json!({"ip": "nsp.lab", "user": "admin"}));
        assert!(!body.contains("token"));

        let (status, body) = call(&router, Method::POST, "/api/nsp/disconnect", None).await;
        assert_eq!((status, body.as_str()), (200, "NSP disconnected"));

        let (status, body) = call(&router, Method::GET, "/api/nsp/status", None).await;
        assert_eq!(status, 409);
        assert!(body.contains("NSP is not connected"));
    }

    #[tokio::test]
    async fn test_connect_missing_credentials() {
        let transport = Arc::new(ScriptedTransport::new());
        let (router, _) = app(&transport);

        let (status, body) = call(
            &router,
            Method::POST,
            "/api/nsp/connect",
            Some(r#"{"ip":"nsp.lab","user":"","pass":"secret"}"#),
        )
        .await;
        assert_eq!(status, 400);
        assert!(body.contains("NSP credentials are missing"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_connect_bad_json() {
        let (router, _) = app(&Arc::new(ScriptedTransport::new()));
        let (status, body) = call(&router, Method::POST, "/api/nsp/connect", Some("{not json")).await;
        assert_eq!(status, 400);
        assert!(body.starts_with("decoding NSP connect request failed"));
    }

    #[tokio::test]
    async fn test_connect_rejected() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_auth_status(Some(401));
        let (router, _) = app(&transport);

        let (status, _) = call(&router, Method::POST, "/api/nsp/connect", Some(CONNECT_BODY)).await;
        assert_eq!(status, 401);
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected() {
        let (router, _) = app(&Arc::new(ScriptedTransport::new()));
        let (status, _) = call(&router, Method::POST, "/api/nsp/disconnect", None).await;
        assert_eq!(status, 409);
    }

    #[tokio::test]
    async fn test_list_nsp_intent_types() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_intent_types(&[("l3vpn", 1), ("elan", 2), ("port_config", 3)]);
        let (router, _) = app(&transport);

        let (status, _) = call(&router, Method::GET, "/api/list/nsp", None).await;
        assert_eq!(status, 409);

        call(&router, Method::POST, "/api/nsp/connect", Some(CONNECT_BODY)).await;
        let (status, body) = call(&router, Method::GET, "/api/list/nsp", None).await;
        assert_eq!(status, 200);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"name": "l3vpn_1"},
                {"name": "elan_2"},
                {"name": "port_config_3"}
            ])
        );
        assert_eq!(transport.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_list_unsupported_kind() {
        let (router, _) = app(&Arc::new(ScriptedTransport::new()));
        let (status, body) = call(&router, Method::GET, "/api/list/remote", None).await;
        assert_eq!((status, body.as_str()), (400, "unsupported kind"));
    }

    #[tokio::test]
    async fn test_intent_type_modules() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_modules(
            "l3vpn",
            2,
            vec![nspconnect_core::YangModule {
                name: "l3vpn.yang".into(),
                yang_content: "module l3vpn {}".into(),
            }],
        );
        let (router, _) = app(&transport);
        call(&router, Method::POST, "/api/nsp/connect", Some(CONNECT_BODY)).await;

        let (status, body) = call(&router, Method::GET, "/api/nsp/intent-types/l3vpn_2/modules", None).await;
        assert_eq!(status, 200);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"name": "l3vpn.yang", "yang-content": "module l3vpn {}"}])
        );

        let (status, _) = call(&router, Method::GET, "/api/nsp/intent-types/noversion/modules", None).await;
        assert_eq!(status, 400);

        let (status, _) = call(&router, Method::GET, "/api/nsp/intent-types/missing_9/modules", None).await;
        assert_eq!(status, 502);
    }

    #[tokio::test]
    async fn test_cors_header_present() {
        let (router, _) = app(&Arc::new(ScriptedTransport::new()));
        let request = Request::builder()
            .uri("/api/ping")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}
