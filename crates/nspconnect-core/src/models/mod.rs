//! Wire types for the NSP endpoints.
//!
//! - `auth`: token issue response
//! - `intent`: intent-type search payloads and catalog entries

pub mod auth;
pub mod intent;

pub use auth::AuthResponse;
pub use intent::{
    IntentTypeDefinition, IntentTypeEntry, IntentTypeSearchRequest, IntentTypeSearchResponse,
    SearchOutput, YangModule,
};
