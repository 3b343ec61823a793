use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// An NSP access token and its lifetime.
///
/// A token with a ttl of 0 never expires and is never renewed.
#[derive(Clone)]
pub struct Token {
    access_token: String,
    ttl: Duration,
    acquired_at: Instant,
}

impl Token {
    pub fn new(access_token: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            access_token: access_token.into(),
            ttl: Duration::from_secs(ttl_secs),
            acquired_at: Instant::now(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_expired(&self) -> bool {
        match self.time_until_expiry() {
            Some(remaining) => remaining.is_zero(),
            None => false,
        }
    }

    /// Time left before expiry, `None` for a non-expiring token
    pub fn time_until_expiry(&self) -> Option<Duration> {
        if self.ttl.is_zero() {
            return None;
        }
        let expiry = self.acquired_at + self.ttl;
        Some(expiry.saturating_duration_since(Instant::now()))
    }

    /// How long to wait before renewing, or `None` when the lifetime does
    /// not exceed the safety margin.
    pub fn renewal_delay(&self, margin: Duration) -> Option<Duration> {
        if self.ttl > margin {
            Some(self.ttl - margin)
        } else {
            None
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}
