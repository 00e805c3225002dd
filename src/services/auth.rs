//! Auth session manager: login, registration and logout against the backend.
//!
//! ARCHITECTURE
//! ============
//! The manager owns the in-memory session (`watch::Sender<AuthState>`) and the
//! `SessionStore` that mirrors it on disk. State only moves after a request
//! completes successfully, so a dropped or failed call leaves it untouched.
//!
//! TRADE-OFFS
//! ==========
//! There is no in-flight lock: two concurrent `login` calls both run and the
//! last success wins. Duplicate submissions are the caller's concern.
//! Logout tears down locally before the best-effort server call, so a slow or
//! failing backend can never keep a session alive.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use reqwest::Method;
use tokio::sync::watch;

use crate::error::{ApiError, AuthError};
use crate::net::api::{ApiClient, decode};
use crate::net::types::{AuthResponse, Credentials, RegistrationData, Session, User};
use crate::state::{AuthState, AuthWatch};
use crate::storage::SessionStore;

/// Result of a successful `/register` call.
#[derive(Debug)]
pub enum RegisterOutcome {
    /// Signed in, either from the registration token or the follow-up login.
    Authenticated(Session),
    /// Account created; the caller should send the user to the login screen.
    Registered { user: Option<User> },
    /// Account created, but the automatic login afterwards failed.
    RegisteredLoginFailed { user: Option<User>, error: AuthError },
}

pub struct AuthManager {
    api: ApiClient,
    store: SessionStore,
    state: watch::Sender<AuthState>,
    auto_login_after_register: bool,
}

impl AuthManager {
    #[must_use]
    pub fn new(api: ApiClient, store: SessionStore) -> Self {
        let (state, _) = watch::channel(AuthState::Pending);
        Self { api, store, state, auto_login_after_register: true }
    }

    /// Whether `register` follows a token-less registration with a login.
    #[must_use]
    pub fn with_auto_login_after_register(mut self, enabled: bool) -> Self {
        self.auto_login_after_register = enabled;
        self
    }

    /// Read-only view of the session state.
    #[must_use]
    pub fn subscribe(&self) -> AuthWatch {
        AuthWatch::new(self.state.subscribe())
    }

    #[must_use]
    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Resolve `Pending` from the persisted session. Later calls are no-ops.
    pub fn initialize(&self) -> AuthState {
        let mut resolved = None;
        self.state.send_if_modified(|state| {
            if !state.is_pending() {
                return false;
            }
            *state = match self.store.load() {
                Some(session) => {
                    tracing::info!(user_id = session.user.id, "session restored");
                    AuthState::Authenticated(session)
                }
                None => {
                    tracing::debug!("no persisted session");
                    AuthState::Anonymous
                }
            };
            resolved = Some(state.clone());
            true
        });
        resolved.unwrap_or_else(|| self.current())
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank field (no request sent), `InvalidCredentials`
    /// when the backend rejects the pair, `Api` for network or decode failures.
    /// The session state is unchanged on error.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let credentials = credentials.validate()?;

        let request = self.api.request(Method::POST, &["login"], None)?.json(&credentials);
        let body = self.api.send(request).await.map_err(|e| {
            tracing::info!(error = %e, "login rejected");
            AuthError::from_login_failure(e)
        })?;

        let response: AuthResponse = decode(body)?;
        let session = match response {
            AuthResponse { token: Some(token), user: Some(user) } if !token.is_empty() => Session { token, user },
            _ => return Err(ApiError::Decode("login response is missing token or user".to_owned()).into()),
        };

        self.establish(session.clone());
        tracing::info!(user_id = session.user.id, "login succeeded");
        Ok(session)
    }

    /// Create an account, signing in when the backend (or a follow-up login) allows.
    ///
    /// # Errors
    ///
    /// `Validation` for mismatched passwords or blank fields (no request sent);
    /// `Api` when the backend rejects the registration or cannot be reached.
    pub async fn register(&self, data: &RegistrationData) -> Result<RegisterOutcome, AuthError> {
        data.validate()?;

        let request = self.api.request(Method::POST, &["register"], None)?.json(data);
        let body = self.api.send(request).await?;
        let AuthResponse { token, user } = decode(body)?;
        tracing::info!(user_id = user.as_ref().map(|u| u.id), "registration succeeded");

        match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                let session = Session { token, user };
                self.establish(session.clone());
                Ok(RegisterOutcome::Authenticated(session))
            }
            (_, user) if !self.auto_login_after_register => Ok(RegisterOutcome::Registered { user }),
            (_, user) => match self.login(&data.credentials()).await {
                Ok(session) => Ok(RegisterOutcome::Authenticated(session)),
                Err(error) => {
                    tracing::warn!(error = %error, "login after registration failed");
                    Ok(RegisterOutcome::RegisteredLoginFailed { user, error })
                }
            },
        }
    }

    /// Drop the session locally, then tell the backend (best effort).
    pub async fn logout(&self) {
        let token = self.state.borrow().token().map(ToOwned::to_owned);

        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
        self.state.send_replace(AuthState::Anonymous);
        tracing::info!("logged out");

        let Some(token) = token else {
            return;
        };
        match self.api.request(Method::POST, &["logout"], Some(&token)) {
            Ok(request) => {
                if let Err(e) = self.api.send(request).await {
                    tracing::warn!(error = %e, "server-side logout failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "server-side logout skipped"),
        }
    }

    fn establish(&self, session: Session) {
        if let Err(e) = self.store.save(&session) {
            tracing::warn!(error = %e, "failed to persist session");
        }
        self.state.send_replace(AuthState::Authenticated(session));
    }
}
