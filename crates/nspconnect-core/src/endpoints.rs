//! NSP REST gateway and RESTCONF paths.

/// Token issue endpoint of the REST gateway
pub const AUTH_TOKEN_PATH: &str = "/rest-gateway/rest/api/v1/auth/token";

/// Token revocation endpoint of the REST gateway
pub const AUTH_REVOKE_PATH: &str = "/rest-gateway/rest/api/v1/auth/revocation";

/// RESTCONF operation listing the intent-type catalog page by page
pub const SEARCH_INTENT_TYPES_PATH: &str =
    "/restconf/operations/ibn-administration:search-intent-types";

/// Prefix of a single catalog entry; followed by `<name>,<version>`
pub const INTENT_TYPE_PATH_PREFIX: &str =
    "/restconf/data/ibn-administration:ibn-administration/intent-type-catalog/intent-type=";

/// Build the RESTCONF path of one intent type. The name is percent-encoded
/// since intent type names may contain characters RESTCONF reserves.
pub fn intent_type_path(name: &str, version: u32) -> String {
    format!(
        "{}{},{}",
        INTENT_TYPE_PATH_PREFIX,
        urlencoding::encode(name),
        version
    )
}
