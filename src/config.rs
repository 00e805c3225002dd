//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const SESSION_DIR: &str = ".papeleria";
const SESSION_FILE: &str = "session.json";
const FALLBACK_SESSION_FILE: &str = ".papeleria-session.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API URL '{0}' (expected an http:// or https:// URL)")]
    InvalidApiUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base, without trailing slash (e.g. `http://127.0.0.1:8000/api`).
    pub api_url: String,
    pub session_file: PathBuf,
    pub timeouts: Timeouts,
    /// Sign in with the registration credentials when `/register` returns no token.
    pub auto_login_after_register: bool,
}

impl ClientConfig {
    /// Build a config for `api_url` with every other setting at its default.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_url` is not an http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: normalize_api_url(api_url)?,
            session_file: default_session_file(),
            timeouts: Timeouts::default(),
            auto_login_after_register: true,
        })
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `PAPELERIA_API_URL`: default `http://127.0.0.1:8000/api`
    /// - `PAPELERIA_SESSION_FILE`: default `$HOME/.papeleria/session.json`
    /// - `PAPELERIA_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PAPELERIA_CONNECT_TIMEOUT_SECS`: default 10
    /// - `PAPELERIA_AUTO_LOGIN_AFTER_REGISTER`: default true
    ///
    /// # Errors
    ///
    /// Returns an error if `PAPELERIA_API_URL` is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("PAPELERIA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let session_file = std::env::var("PAPELERIA_SESSION_FILE")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map_or_else(default_session_file, PathBuf::from);
        let timeouts = Timeouts {
            request_secs: env_parse_u64("PAPELERIA_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("PAPELERIA_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let auto_login_after_register = env_bool("PAPELERIA_AUTO_LOGIN_AFTER_REGISTER").unwrap_or(true);

        Ok(Self { api_url: normalize_api_url(&api_url)?, session_file, timeouts, auto_login_after_register })
    }

    /// Replace the API base URL, keeping every other setting.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_url` is not an http(s) URL.
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, ConfigError> {
        self.api_url = normalize_api_url(api_url)?;
        Ok(self)
    }
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ConfigError::InvalidApiUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn default_session_file() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(SESSION_DIR).join(SESSION_FILE),
        _ => PathBuf::from(FALLBACK_SESSION_FILE),
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
