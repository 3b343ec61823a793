//! Core library for nspconnect.
//!
//! This crate owns the NSP session lifecycle and the intent-type catalog
//! client:
//!
//! - `auth`: credentials, tokens and the `SessionManager` that renews the
//!   access token in the background for the lifetime of a connection
//! - `catalog`: paginated intent-type search and YANG module retrieval
//! - `transport`: the single-exchange HTTP seam, with a reqwest implementation
//! - `config`: runtime configuration loaded from disk and the environment

pub mod auth;
pub mod catalog;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::{Credentials, SessionEvent, SessionManager, SessionStatus, Token};
pub use catalog::{IntentCatalog, IntentTypeKey};
pub use config::Config;
pub use error::{ErrorCategory, NspError, TransportError};
pub use models::YangModule;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
