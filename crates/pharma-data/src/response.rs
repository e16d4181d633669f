//! HTTP response handling.

use crate::FetchError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response was a client error (4xx status).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response was a server error (5xx status).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| FetchError::ParseError(format!("Invalid UTF-8: {}", e)))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    /// The body as loose JSON. An empty body reads as `null`.
    pub fn value(&self) -> Result<Value, FetchError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        self.json()
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    ///
    /// The message is taken from a JSON `message` or `error` field when the
    /// server sends one, else from the raw body.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            return Ok(self);
        }
        let raw = self.text().unwrap_or_default();
        let from_json = serde_json::from_str::<Value>(&raw).ok().and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        });
        let message = from_json
            .or_else(|| Some(raw.trim().to_string()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| format!("HTTP {}", self.status));
        Err(FetchError::HttpError {
            status: self.status,
            message,
        })
    }
}
