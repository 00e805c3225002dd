//! Auth-session state for the current user.
//!
//! DESIGN
//! ======
//! The auth session manager owns the only `watch::Sender<AuthState>`. Route
//! guards, screens and the product client hold an `AuthWatch`, which can read
//! and await changes but has no way to write.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use tokio::sync::watch;

use crate::net::types::{Session, User, is_admin};

/// Tri-state session view: `Pending` until the persisted session has been read.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AuthState {
    #[default]
    Pending,
    Anonymous,
    Authenticated(Session),
}

impl AuthState {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session().map(|s| &s.user)
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session().map(|s| s.token.as_str())
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.session().is_some_and(is_admin)
    }
}

/// Read-only handle on the shared auth state.
#[derive(Clone, Debug)]
pub struct AuthWatch {
    rx: watch::Receiver<AuthState>,
}

impl AuthWatch {
    pub(crate) fn new(rx: watch::Receiver<AuthState>) -> Self {
        Self { rx }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> AuthState {
        self.rx.borrow().clone()
    }

    /// Bearer token of the current session, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.rx.borrow().token().map(ToOwned::to_owned)
    }

    /// Wait until the state is no longer `Pending` and return it.
    ///
    /// Returns the last seen state if the manager is dropped first.
    pub async fn resolved(&mut self) -> AuthState {
        let resolved = self
            .rx
            .wait_for(|state| !state.is_pending())
            .await
            .map(|state| AuthState::clone(&state));
        resolved.unwrap_or_else(|_| self.rx.borrow().clone())
    }

    /// Wait for the next state change.
    ///
    /// # Errors
    ///
    /// Returns an error once the owning manager has been dropped.
    pub async fn changed(&mut self) -> Result<AuthState, watch::error::RecvError> {
        self.rx.changed().await?;
        Ok(self.rx.borrow_and_update().clone())
    }
}
