//! HTTP surface: router, shared state and handlers.

pub mod handlers;
pub mod server;

use std::sync::Arc;

use nspconnect_core::{IntentCatalog, SessionManager};

pub use server::start_web_server;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
    pub catalog: Arc<IntentCatalog>,
}

impl AppState {
    pub fn new(session: Arc<SessionManager>, catalog: Arc<IntentCatalog>) -> Self {
        Self { session, catalog }
    }
}
