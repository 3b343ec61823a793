use std::fmt;

use serde::Deserialize;

use crate::error::NspError;

/// Connection parameters for one NSP session. Held in memory only.
///
/// Absent fields deserialize as empty so they are reported as missing
/// credentials rather than as a decode failure.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Credentials {
    #[serde(rename = "ip")]
    pub host: String,
    #[serde(rename = "user")]
    pub username: String,
    #[serde(rename = "pass")]
    pub password: String,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Every field must be non-empty
    pub fn validate(&self) -> Result<(), NspError> {
        if self.host.trim().is_empty() || self.username.is_empty() || self.password.is_empty() {
            return Err(NspError::MissingCredentials);
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
