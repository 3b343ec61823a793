//! nspconnect - HTTP front end for NSP intent-type browsing.
//!
//! Exposes connect/disconnect/status for a single NSP session and lists the
//! intent-type catalog with its YANG modules. The access token is renewed in
//! the background for as long as the session is connected.

mod web;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nspconnect_core::{Config, HttpTransport, IntentCatalog, SessionEvent, SessionManager};

/// Default log filter when RUST_LOG is unset
const DEFAULT_LOG_FILTER: &str = "nspconnect=info,nspconnect_core=info,tower_http=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Initialize the tracing subscriber, optionally mirroring logs into a
/// daily rolling file. The returned guard must live as long as the process.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let mut guard = None;
    let file_layer = log_dir.map(|dir| {
        let file_appender = tracing_appender::rolling::daily(dir, "nspconnect.log");
        let (writer, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(env_filter())
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(env_filter()))
        .init();

    guard
}

/// Report session lifecycle changes; renewal failures end up here.
async fn log_session_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::RenewalFailed { host, reason }) => {
                warn!(host = %host, reason = %reason, "NSP session lost, reconnect required");
            }
            Ok(event) => info!(?event, "NSP session event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Session event observer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load().context("Failed to load configuration")?;
    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!(listen = %config.listen_addr, scheme = %config.scheme, "nspconnect starting");

    let transport = HttpTransport::from_config(&config)?;
    let session = Arc::new(
        SessionManager::new(Arc::new(transport)).with_renewal_margin(config.renewal_margin()),
    );
    let catalog = Arc::new(
        IntentCatalog::new(session.clone())
            .with_default_page_size(config.search_page_size)
            .with_max_pages(config.max_search_pages),
    );

    tokio::spawn(log_session_events(session.subscribe()));

    let state = web::AppState::new(session.clone(), catalog);
    let served = web::start_web_server(&config.listen_addr, state).await;

    // Do not leave a live token behind on the NSP side, even if serving failed
    if session.is_connected().await {
        if let Err(e) = session.disconnect().await {
            warn!(error = %e, "Failed to revoke NSP token on shutdown");
        }
    }

    info!("nspconnect shutting down");
    served
}
