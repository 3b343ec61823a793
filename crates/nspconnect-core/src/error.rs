use thiserror::Error;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Failure of a single HTTP exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

impl TransportError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        TransportError::Status {
            status,
            body: Self::truncate_body(body),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NspError {
    #[error("NSP credentials are missing")]
    MissingCredentials,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("NSP is not connected")]
    NotConnected,

    #[error("Token revocation failed: {0}")]
    Revoke(String),

    #[error("No active NSP session")]
    Session,

    #[error("Access token expired")]
    TokenExpired,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unexpected response shape: {0}")]
    Schema(String),

    #[error("Invalid intent type key: {0}")]
    MalformedKey(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Coarse classification callers use to decide whether to reconnect,
/// fix their input, or report an upstream problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotConnected,
    BadCredentials,
    BadRequest,
    Upstream,
}

impl NspError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NspError::NotConnected | NspError::Session | NspError::TokenExpired => {
                ErrorCategory::NotConnected
            }
            NspError::Auth(_) => ErrorCategory::BadCredentials,
            NspError::MissingCredentials
            | NspError::MalformedKey(_)
            | NspError::InvalidArgument(_) => ErrorCategory::BadRequest,
            NspError::Revoke(_) | NspError::Transport(_) | NspError::Schema(_) => {
                ErrorCategory::Upstream
            }
        }
    }
}
