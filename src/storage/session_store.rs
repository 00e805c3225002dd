//! Session persistence on top of a `Storage` backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Read once at start-up by the auth session manager, written on every login
//! and cleared on logout. A persisted pair that cannot be turned back into a
//! session is discarded (and logged), never surfaced as an error.

#[cfg(test)]
#[path = "session_store_test.rs"]
mod session_store_test;

use std::sync::Arc;

use super::{Storage, StorageError};
use crate::net::types::{Session, User};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Persist token then user. Two writes; a failure between them leaves a
    /// half pair that `load` discards.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails.
    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        let user = serde_json::to_string(&session.user).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.storage.set(TOKEN_KEY, &session.token)?;
        self.storage.set(USER_KEY, &user)
    }

    /// Previously saved session, or `None`.
    ///
    /// Missing halves, an empty token, a user record that does not parse or a
    /// storage file that is not a JSON object all clear both keys and yield
    /// `None`.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        let (token, user) = match (self.storage.get(TOKEN_KEY), self.storage.get(USER_KEY)) {
            (Ok(token), Ok(user)) => (token, user),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "session storage read failed");
                if matches!(e, StorageError::Corrupt { .. }) {
                    self.clear_quietly();
                }
                return None;
            }
        };

        match (token, user) {
            (None, None) => None,
            (Some(token), Some(raw_user)) if !token.is_empty() => match serde_json::from_str::<User>(&raw_user) {
                Ok(user) => Some(Session { token, user }),
                Err(e) => {
                    tracing::warn!(error = %e, "persisted user record is corrupt; discarding session");
                    self.clear_quietly();
                    None
                }
            },
            _ => {
                tracing::warn!("persisted session is incomplete; discarding");
                self.clear_quietly();
                None
            }
        }
    }

    /// Remove both entries.
    ///
    /// # Errors
    ///
    /// Returns the first removal error; the second removal is still attempted.
    pub fn clear(&self) -> Result<(), StorageError> {
        let token = self.storage.remove(TOKEN_KEY);
        let user = self.storage.remove(USER_KEY);
        token.and(user)
    }

    fn clear_quietly(&self) {
        if let Err(e) = self.clear() {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
    }
}
