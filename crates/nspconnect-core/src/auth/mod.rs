//! Authentication module for managing the NSP session.
//!
//! This module provides:
//! - `Credentials`: host, username and password for one connection attempt
//! - `Token`: the access token with its lifetime
//! - `SessionManager`: the single holder of connection state, which renews
//!   the token in the background before it expires
//!
//! Nothing here is persisted; a restart requires a fresh connect.

pub mod credentials;
pub mod manager;
pub mod session;

pub use credentials::Credentials;
pub use manager::{SessionEvent, SessionManager, SessionStatus};
pub use session::Token;
