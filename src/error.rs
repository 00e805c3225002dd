//! Error taxonomy shared by the session, auth and product layers.
//!
//! ERROR HANDLING
//! ==============
//! Client-side validation never reaches the network. Backend payloads are
//! carried unchanged in `ApiError::Backend`; the only local classification is
//! `ApiError::Network` for requests that never produced a response.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

// =============================================================================
// VALIDATION
// =============================================================================

/// Client-side form validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must not be negative")]
    Negative(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

// =============================================================================
// API
// =============================================================================

/// Failures of a single HTTP exchange with the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received (connect failure, timeout, DNS).
    #[error("network error: could not reach the server ({0})")]
    Network(String),

    /// The backend answered with a non-success status. `body` is untouched.
    #[error("{}", display_backend(*status, body))]
    Backend { status: u16, body: Value },

    /// A success response whose body did not match the expected shape.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// A request could not be built (bad URL, invalid header value).
    #[error("request build failed: {0}")]
    Request(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ApiError {
    /// HTTP status of a backend error, if the backend answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable messages extracted from a backend error body.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Backend { body, .. } => backend_messages(body),
            other => vec![other.to_string()],
        }
    }
}

fn display_backend(status: u16, body: &Value) -> String {
    let messages = backend_messages(body);
    if messages.is_empty() {
        format!("server returned HTTP {status}")
    } else {
        messages.join("\n")
    }
}

/// Pull display messages out of a backend error body.
///
/// Per-field `errors` maps are flattened in key order, then `error`, then
/// `message`. Returns an empty list when nothing textual is present.
#[must_use]
pub fn backend_messages(body: &Value) -> Vec<String> {
    if let Some(errors) = body.get("errors") {
        let mut out = Vec::new();
        collect_strings(errors, &mut out);
        if !out.is_empty() {
            return out;
        }
    }
    for key in ["error", "message"] {
        if let Some(text) = body.get(key).and_then(Value::as_str) {
            if !text.trim().is_empty() {
                return vec![text.to_owned()];
            }
        }
    }
    Vec::new()
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}

// =============================================================================
// AUTH
// =============================================================================

pub const DEFAULT_INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials. Please try again.";

/// Failures surfaced by the auth session manager.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend rejected the credentials; the message is the backend's own.
    #[error("{0}")]
    InvalidCredentials(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Reclassify a failed login exchange: any backend answer is a credential
    /// rejection, everything else passes through.
    #[must_use]
    pub(crate) fn from_login_failure(error: ApiError) -> Self {
        match error {
            ApiError::Backend { body, .. } => {
                let messages = backend_messages(&body);
                if messages.is_empty() {
                    Self::InvalidCredentials(DEFAULT_INVALID_CREDENTIALS_MESSAGE.to_owned())
                } else {
                    Self::InvalidCredentials(messages.join("\n"))
                }
            }
            other => Self::Api(other),
        }
    }

    /// True when no response was received.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Api(ApiError::Network(_)))
    }
}
