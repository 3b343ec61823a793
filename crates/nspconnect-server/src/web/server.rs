use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::web::{handlers, AppState};

pub async fn start_web_server(addr: &str, state: AppState) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/ping", get(handlers::ping))
        // === NSP SESSION ROUTES ===
        .route("/api/nsp/connect", post(handlers::nsp_connect))
        .route("/api/nsp/disconnect", post(handlers::nsp_disconnect))
        .route("/api/nsp/status", get(handlers::nsp_status))
        // === INTENT TYPE CATALOG ROUTES ===
        .route("/api/list/{kind}", get(handlers::list))
        .route(
            "/api/nsp/intent-types/{key}/modules",
            get(handlers::intent_type_modules),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
