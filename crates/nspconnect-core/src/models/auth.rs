use serde::Deserialize;

/// Body returned by the REST gateway token endpoint.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Lifetime in seconds; absent or 0 means the token is not renewed.
    #[serde(default)]
    pub expires_in: u64,
}
