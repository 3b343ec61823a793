//! The NSP session: connection state, token ownership and renewal.
//!
//! All mutable state lives behind one async mutex. Connect and disconnect
//! never hold it across a network call; the renewal task holds it across
//! its revoke+reacquire pair so concurrent readers wait and then observe the
//! new token.
//!
//! Every connect and disconnect bumps a generation counter. A renewal task
//! only touches the session if the generation it was spawned for is still
//! current, so a stale task can never renew a newer session.
//!
//! The renewal task only holds a weak reference to the session state. When
//! the `SessionManager` is dropped the state goes with it, the cancel sender
//! is dropped and the task exits.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{Credentials, Token};
use crate::endpoints::{AUTH_REVOKE_PATH, AUTH_TOKEN_PATH};
use crate::error::NspError;
use crate::models::AuthResponse;
use crate::transport::{ApiRequest, Transport};

/// Default safety margin before token expiry at which renewal happens.
const DEFAULT_RENEWAL_MARGIN: Duration = Duration::from_secs(10);

/// Buffered session events per subscriber before old ones are dropped.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Lifecycle notifications for observers (logs, metrics, UI status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected { host: String, user: String },
    Renewed { host: String, ttl_secs: u64 },
    RenewalFailed { host: String, reason: String },
    Disconnected { host: String },
}

/// Non-secret identity of the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub host: String,
    pub user: String,
    pub connected_at: DateTime<Utc>,
}

/// Host and token read together under the session lock.
#[derive(Debug, Clone)]
pub(crate) struct Authorized {
    pub host: String,
    pub token: Token,
}

struct RenewalHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RenewalHandle {
    /// Stop the renewal task. Called with the session lock held, so the task
    /// is either sleeping or waiting for the lock, never mid-renewal.
    fn cancel(self) {
        let _ = self.cancel.send(true);
        self.task.abort();
    }
}

struct ActiveSession {
    credentials: Credentials,
    token: Token,
    connected_at: DateTime<Utc>,
    renewal: Option<RenewalHandle>,
}

#[derive(Default)]
struct SessionInner {
    generation: u64,
    active: Option<ActiveSession>,
}

impl SessionInner {
    /// Detach the active session and close its renewal lineage.
    fn end_session(&mut self) -> Option<ActiveSession> {
        self.generation += 1;
        let mut active = self.active.take()?;
        if let Some(renewal) = active.renewal.take() {
            renewal.cancel();
        }
        Some(active)
    }
}

/// Single authoritative holder of the NSP connection.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    renewal_margin: Duration,
    inner: Arc<Mutex<SessionInner>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            renewal_margin: DEFAULT_RENEWAL_MARGIN,
            inner: Arc::new(Mutex::new(SessionInner::default())),
            events,
        }
    }

    pub fn with_renewal_margin(mut self, margin: Duration) -> Self {
        self.renewal_margin = margin;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Authenticate against NSP and make this the active session.
    ///
    /// Replacing an existing session closes its renewal lineage and revokes
    /// its token on a best-effort basis.
    pub async fn connect(&self, credentials: Credentials) -> Result<(), NspError> {
        credentials.validate()?;

        let token = acquire_token(self.transport.as_ref(), &credentials).await?;
        let host = credentials.host.clone();
        let user = credentials.username.clone();

        let replaced = {
            let mut inner = self.inner.lock().await;
            let replaced = inner.end_session();
            let generation = inner.generation;

            let renewal = self.spawn_renewal(generation, &token);
            inner.active = Some(ActiveSession {
                credentials,
                token,
                connected_at: Utc::now(),
                renewal,
            });
            replaced
        };

        if let Some(previous) = replaced {
            debug!(host = %previous.credentials.host, "Revoking token of replaced session");
            if let Err(e) =
                revoke_token(self.transport.as_ref(), &previous.credentials, &previous.token).await
            {
                warn!(host = %previous.credentials.host, error = %e, "Failed to revoke replaced token");
            }
        }

        info!(host = %host, user = %user, "NSP connected");
        let _ = self.events.send(SessionEvent::Connected { host, user });
        Ok(())
    }

    /// Close the active session and revoke its token.
    ///
    /// Local state is cleared before the revoke call, so a `Revoke` error
    /// still leaves the manager disconnected.
    pub async fn disconnect(&self) -> Result<(), NspError> {
        let Some(previous) = self.inner.lock().await.end_session() else {
            return Err(NspError::NotConnected);
        };

        let host = previous.credentials.host.clone();
        let _ = self.events.send(SessionEvent::Disconnected { host: host.clone() });

        match revoke_token(self.transport.as_ref(), &previous.credentials, &previous.token).await {
            Ok(()) => {
                info!(host = %host, "NSP disconnected");
                Ok(())
            }
            Err(e) => {
                warn!(host = %host, error = %e, "NSP session cleared but token revocation failed");
                Err(e)
            }
        }
    }

    pub async fn status(&self) -> Result<SessionStatus, NspError> {
        let inner = self.inner.lock().await;
        let active = inner.active.as_ref().ok_or(NspError::NotConnected)?;
        Ok(SessionStatus {
            host: active.credentials.host.clone(),
            user: active.credentials.username.clone(),
            connected_at: active.connected_at,
        })
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.active.is_some()
    }

    pub async fn current_token(&self) -> Result<Token, NspError> {
        Ok(self.authorized().await?.token)
    }

    pub(crate) async fn authorized(&self) -> Result<Authorized, NspError> {
        let inner = self.inner.lock().await;
        let active = inner.active.as_ref().ok_or(NspError::NotConnected)?;
        if active.token.is_expired() {
            return Err(NspError::TokenExpired);
        }
        Ok(Authorized {
            host: active.credentials.host.clone(),
            token: active.token.clone(),
        })
    }

    fn spawn_renewal(&self, generation: u64, token: &Token) -> Option<RenewalHandle> {
        let Some(delay) = token.renewal_delay(self.renewal_margin) else {
            info!(
                ttl_secs = token.ttl().as_secs(),
                "Token lifetime within renewal margin, not scheduling renewal"
            );
            return None;
        };

        let (cancel, cancelled) = watch::channel(false);
        let worker = RenewalWorker {
            generation,
            margin: self.renewal_margin,
            inner: Arc::downgrade(&self.inner),
            transport: Arc::clone(&self.transport),
            events: self.events.clone(),
        };
        let task = tokio::spawn(worker.run(cancelled, delay));
        Some(RenewalHandle { cancel, task })
    }
}

/// Background token renewal for one session generation.
struct RenewalWorker {
    generation: u64,
    margin: Duration,
    inner: Weak<Mutex<SessionInner>>,
    transport: Arc<dyn Transport>,
    events: broadcast::Sender<SessionEvent>,
}

impl RenewalWorker {
    async fn run(self, mut cancelled: watch::Receiver<bool>, mut delay: Duration) {
        loop {
            if *cancelled.borrow() {
                return;
            }

            debug!(generation = self.generation, delay_secs = delay.as_secs(), "Token renewal scheduled");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                // Err means the session state was dropped
                _ = cancelled.changed() => return,
            }

            if *cancelled.borrow() {
                return;
            }

            let Some(state) = self.inner.upgrade() else {
                return;
            };
            let mut inner = state.lock().await;
            if inner.generation != self.generation {
                return;
            }
            let Some(active) = inner.active.as_ref() else {
                return;
            };

            let host = active.credentials.host.clone();
            info!(host = %host, "NSP access renewal initiated");
            let renewed = self.renew(&active.credentials, &active.token).await;

            match renewed {
                Ok(token) => {
                    let ttl_secs = token.ttl().as_secs();
                    let next = token.renewal_delay(self.margin);
                    if let Some(active) = inner.active.as_mut() {
                        active.token = token;
                    }
                    info!(host = %host, ttl_secs, "NSP access renewed");
                    let _ = self.events.send(SessionEvent::Renewed {
                        host: host.clone(),
                        ttl_secs,
                    });

                    match next {
                        Some(next) => delay = next,
                        None => {
                            info!(host = %host, ttl_secs, "Renewed token is not renewable, stopping renewal");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!(host = %host, error = %e, "NSP access renewal failed, session closed");
                    // Own handle is dropped here without aborting
                    inner.generation += 1;
                    inner.active = None;
                    drop(inner);

                    let _ = self.events.send(SessionEvent::RenewalFailed {
                        host: host.clone(),
                        reason: e.to_string(),
                    });
                    let _ = self.events.send(SessionEvent::Disconnected { host });
                    return;
                }
            }
        }
    }

    async fn renew(&self, credentials: &Credentials, token: &Token) -> Result<Token, NspError> {
        revoke_token(self.transport.as_ref(), credentials, token).await?;
        acquire_token(self.transport.as_ref(), credentials).await
    }
}

/// Obtain a new access token with the given credentials.
async fn acquire_token(transport: &dyn Transport, credentials: &Credentials) -> Result<Token, NspError> {
    let request = ApiRequest::post(&credentials.host, AUTH_TOKEN_PATH)
        .basic_auth(&credentials.username, &credentials.password)
        .json(serde_json::json!({ "grant_type": "client_credentials" }));

    let response = transport.send(request).await?;
    if !response.is_success() {
        return Err(NspError::Auth(format!(
            "token request rejected with status {}",
            response.status
        )));
    }

    let auth: AuthResponse = response
        .json()
        .map_err(|e| NspError::Auth(format!("Failed to parse auth response: {}", e)))?;
    if auth.access_token.is_empty() {
        return Err(NspError::Auth("auth response carried an empty token".to_string()));
    }

    Ok(Token::new(auth.access_token, auth.expires_in))
}

/// Invalidate `token` on the server.
async fn revoke_token(
    transport: &dyn Transport,
    credentials: &Credentials,
    token: &Token,
) -> Result<(), NspError> {
    let request = ApiRequest::post(&credentials.host, AUTH_REVOKE_PATH)
        .basic_auth(&credentials.username, &credentials.password)
        .form(&[
            ("token", token.access_token()),
            ("token_type_hint", "token"),
        ]);

    let response = transport
        .send(request)
        .await
        .map_err(|e| NspError::Revoke(e.to_string()))?;
    if !response.is_success() {
        return Err(NspError::Revoke(format!(
            "revocation rejected with status {}",
            response.status
        )));
    }
    Ok(())
}
