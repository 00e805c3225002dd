//! REST helpers for communicating with the inventory backend.
//!
//! ERROR HANDLING
//! ==============
//! `send` splits failures three ways: no response (`ApiError::Network`), a
//! non-success status (`ApiError::Backend`, body kept verbatim), and a success
//! body that is not JSON (`ApiError::Decode`). Callers never see a panic.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ClientConfig, Timeouts};
use crate::error::ApiError;

/// Shared HTTP client bound to one API base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client from a parsed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_timeouts(&config.api_url, config.timeouts)
    }

    /// Build a client for `base_url` with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// fails to build.
    pub fn with_timeouts(base_url: &str, timeouts: Timeouts) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::Request(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Request(format!("invalid base URL '{base_url}'")));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments against the base URL, percent-encoding each one.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot take path segments.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::Request(format!("base URL '{}' cannot take a path", self.base_url)))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    /// Start a request to `segments`, with JSON `Accept` and an optional bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built or the token is not a valid
    /// header value.
    pub fn request(&self, method: Method, segments: &[&str], token: Option<&str>) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, authenticated = token.is_some(), "api request");
        let mut builder = self
            .http
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&bearer(token)).map_err(|e| ApiError::Request(e.to_string()))?;
            builder = builder.header(AUTHORIZATION, value);
        }
        Ok(builder)
    }

    /// Send a request and return its JSON body (`Value::Null` when empty).
    ///
    /// # Errors
    ///
    /// See the module docs for the failure split.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let response = builder.send().await.map_err(classify_send_error)?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Backend { status: status.as_u16(), body: parse_error_body(&text) });
        }
        parse_success_body(&text)
    }

    /// Send a request and deserialize its JSON body into `T`.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::send`], plus `ApiError::Decode` when the body does not
    /// match `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let value = self.send(builder).await?;
        decode(value)
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn classify_send_error(error: reqwest::Error) -> ApiError {
    if error.is_builder() {
        ApiError::Request(error.to_string())
    } else {
        ApiError::Network(error.to_string())
    }
}

fn parse_success_body(text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Error bodies are kept even when they are not JSON (HTML error pages, plain text).
fn parse_error_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}
