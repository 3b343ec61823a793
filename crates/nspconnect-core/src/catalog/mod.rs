//! Intent-type catalog client.
//!
//! This module provides the `IntentCatalog` for discovering intent types
//! registered on NSP and fetching the YANG modules attached to each one.
//! Every call borrows the current access token from the `SessionManager`;
//! the catalog never stores a token of its own.

pub mod client;
pub mod key;

pub use client::IntentCatalog;
pub use key::IntentTypeKey;
