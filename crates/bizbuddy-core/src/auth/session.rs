//! Session lifecycle: startup verification, login, registration, logout.
//!
//! The `SessionController` is the single source of truth for "who is signed
//! in". It owns the token store, talks to the backend through the
//! `AuthBackend` seam, and publishes `SessionState` snapshots over a watch
//! channel so any number of consumers (navigation, chat widget, route
//! guards) observe the same state without knowing how persistence or
//! verification work.
//!
//! State machine of the published session: Unknown (until `initialize`
//! resolves) -> Authenticated | Anonymous; Anonymous -> Authenticated via
//! login/registration; Authenticated -> Anonymous via logout or a rejected
//! re-verification. There is no way back to Unknown after startup.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::api::ApiError;
use crate::auth::store::TokenStore;
use crate::models::{Identity, LoginResponse};

/// Registration outcome message when the server supplies no detail.
const REGISTRATION_FALLBACK: &str = "Registration failed";

/// Registration outcome message when the request dies on the wire.
const NETWORK_FALLBACK: &str = "Network error. Please try again.";

/// Verification failure.
///
/// A rejected token and an unreachable backend both land here; the session
/// falls back to anonymous either way. `reason` is for diagnostics only and
/// never reaches the user.
#[derive(Debug, Error)]
#[error("invalid credential")]
pub struct InvalidCredential {
    pub reason: String,
}

/// Network operations the session controller depends on.
///
/// `ApiClient` is the production implementation; tests plug in stubs.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Single verification attempt: token in, identity out, fail closed.
    async fn verify(&self, token: &str) -> Result<Identity, InvalidCredential>;

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    async fn register(&self, username: &str, email: &str, password: &str)
        -> Result<(), ApiError>;
}

/// Published session snapshot.
///
/// `is_loading` is true only before `initialize` resolves and while a
/// login or registration call is in flight; `identity` is present exactly
/// when a valid token is believed to exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub is_loading: bool,
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }
}

/// Result of `register`.
///
/// `success` mirrors the follow-up login: registration is "create the
/// account, then sign in with the same credentials". `error` is set only
/// when the registration call itself was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOutcome {
    pub success: bool,
    pub error: Option<String>,
}

/// Orchestrates the session against the token store and the backend.
pub struct SessionController {
    store: Arc<dyn TokenStore>,
    backend: Arc<dyn AuthBackend>,
    state_tx: watch::Sender<SessionState>,
    /// Serializes mutating operations so a logout racing a slow login
    /// cannot resurrect a cleared token.
    write_gate: Mutex<()>,
}

impl SessionController {
    pub fn new(store: Arc<dyn TokenStore>, backend: Arc<dyn AuthBackend>) -> Self {
        // Consumers must treat this initial state as "decision pending",
        // never as anonymous.
        let (state_tx, _) = watch::channel(SessionState {
            identity: None,
            is_loading: true,
        });

        Self {
            store,
            backend,
            state_tx,
            write_gate: Mutex::new(()),
        }
    }

    /// Watch the published session state. Each observed value is an atomic
    /// snapshot; identity and loading flag never tear.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Current session snapshot.
    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state_tx.borrow().is_logged_in()
    }

    /// The stored token, as the chat call attaches it. Absent when anonymous.
    pub async fn token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    /// Resolve the stored session once at startup.
    ///
    /// Always terminates with `is_loading = false`: a missing token resolves
    /// to anonymous immediately, a rejected or unverifiable token clears the
    /// store and resolves to anonymous, a verified token publishes the
    /// returned identity.
    pub async fn initialize(&self) {
        let _gate = self.write_gate.lock().await;
        self.state_tx.send_modify(|s| s.is_loading = true);

        let token = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read token store at startup");
                None
            }
        };

        let Some(token) = token else {
            debug!("No stored token; starting anonymous");
            self.publish(None);
            return;
        };

        match self.backend.verify(&token).await {
            Ok(identity) => {
                info!(user = %identity.username, "Session restored");
                self.publish(Some(identity));
            }
            Err(e) => {
                debug!(reason = %e.reason, "Stored token rejected; clearing");
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "Failed to clear rejected token");
                }
                self.publish(None);
            }
        }
    }

    /// Sign in. Returns `true` on success; on any failure (rejected
    /// credentials, transport error, malformed response) the prior state is
    /// left untouched and the diagnostic goes to the log, not the caller.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let _gate = self.write_gate.lock().await;
        self.login_locked(email, password).await
    }

    async fn login_locked(&self, email: &str, password: &str) -> bool {
        self.state_tx.send_modify(|s| s.is_loading = true);

        match self.backend.login(email, password).await {
            Ok(LoginResponse {
                access_token, user, ..
            }) => {
                // Persist before publishing: a consumer that observes a
                // signed-in state must find the token in the store.
                if let Err(e) = self.store.save(&access_token) {
                    error!(error = %e, "Failed to persist token; aborting login");
                    self.state_tx.send_modify(|s| s.is_loading = false);
                    return false;
                }

                info!(user = %user.username, "Login successful");
                self.publish(Some(user));
                true
            }
            Err(e) => {
                debug!(error = %e, "Login failed");
                self.state_tx.send_modify(|s| s.is_loading = false);
                false
            }
        }
    }

    /// Create an account, then immediately sign in with the same
    /// credentials. The outcome's `success` is strictly the login result;
    /// when registration itself is rejected, `error` carries the server's
    /// detail message or a generic fallback and no login is attempted.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> RegisterOutcome {
        let _gate = self.write_gate.lock().await;
        self.state_tx.send_modify(|s| s.is_loading = true);

        match self.backend.register(username, email, password).await {
            Ok(()) => {
                let success = self.login_locked(email, password).await;
                if !success {
                    // The account now exists but the outcome reports only
                    // the login result; see the registration contract.
                    warn!(username, "Registration succeeded but immediate login failed");
                }
                RegisterOutcome {
                    success,
                    error: None,
                }
            }
            Err(e) => {
                debug!(error = %e, "Registration failed");
                self.state_tx.send_modify(|s| s.is_loading = false);
                RegisterOutcome {
                    success: false,
                    error: Some(register_error_message(e)),
                }
            }
        }
    }

    /// Sign out. Purely local: clears the store and publishes anonymous.
    /// Idempotent, and never fails - a store error is logged and the
    /// anonymous state is published regardless.
    pub async fn logout(&self) {
        let _gate = self.write_gate.lock().await;

        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear token store on logout");
        }

        self.publish(None);
        info!("Logged out");
    }

    fn publish(&self, identity: Option<Identity>) {
        self.state_tx.send_replace(SessionState {
            identity,
            is_loading: false,
        });
    }
}

fn register_error_message(err: ApiError) -> String {
    match err {
        ApiError::NetworkError(_) => NETWORK_FALLBACK.to_string(),
        ApiError::BadRequest(detail) if !detail.is_empty() => detail,
        _ => REGISTRATION_FALLBACK.to_string(),
    }
}
