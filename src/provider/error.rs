//! Provider error types and status classification.

use serde_json::Value;
use thiserror::Error;

/// Shown when an error carries no usable text at all.
pub const UNKNOWN_ERROR: &str = "Unknown request error.";

#[derive(Debug, Error)]
pub enum Error {
    /// The gateway answered with a non-success status.
    #[error("HTTP {status}: {text}")]
    Status {
        status: u16,
        text: String,
        /// Parsed JSON body, when the gateway sent one.
        body: Option<Value>,
    },

    /// An error event delivered inside an otherwise successful stream.
    #[error("{message}")]
    Api { message: String, body: Option<Value> },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Failed to build request: {0}")]
    Build(String),
}

impl Error {
    /// Build a status error from a response body, keeping the JSON if it parses.
    pub fn from_status(status: u16, text: String) -> Self {
        let body = serde_json::from_str::<Value>(&text).ok();
        Self::Status { status, text, body }
    }

    /// HTTP status code associated with this error, if any.
    ///
    /// The status carried by the error itself wins; otherwise the chain of
    /// underlying transport errors is searched.
    pub fn status_code(&self) -> Option<u16> {
        if let Self::Status { status, .. } = self {
            return Some(*status);
        }
        nested_status(self)
    }

    fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } | Self::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// The error's own message, without the `HTTP <code>:` decoration.
    fn own_message(&self) -> Option<&str> {
        match self {
            Self::Status { text, .. } => Some(text),
            Self::Api { message, .. } => Some(message),
            _ => None,
        }
    }
}

fn nested_status(err: &(dyn std::error::Error + 'static)) -> Option<u16> {
    let mut current = Some(err);
    while let Some(source) = current {
        if let Some(status) = source
            .downcast_ref::<reqwest::Error>()
            .and_then(reqwest::Error::status)
        {
            return Some(status.as_u16());
        }
        current = source.source();
    }
    None
}

/// Fixed operator advice for status codes worth explaining.
#[must_use]
pub fn known_status_message(status: u16) -> Option<&'static str> {
    match status {
        401 => Some("401 Unauthorized. Check your API key."),
        402 => Some("402 Payment Required. Check your GonkaGate balance or billing status."),
        429 => Some("429 Too Many Requests. Slow down request rate and retry."),
        503 => Some("503 Service Unavailable. Retry in a few seconds."),
        _ => None,
    }
}

/// How much digging to do when the status code is not a known one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Use the error's display text.
    Plain,
    /// Prefer the message inside the JSON error body.
    Detailed,
}

/// Turn a provider error into a single user-facing line.
#[must_use]
pub fn friendly_message(err: &Error, fallback: Fallback) -> String {
    if let Some(message) = err.status_code().and_then(known_status_message) {
        return message.to_string();
    }

    if fallback == Fallback::Detailed {
        let detailed = err
            .body()
            .and_then(extract_error_message)
            .or_else(|| err.own_message().and_then(non_blank));
        if let Some(message) = detailed {
            return message;
        }
    }

    non_blank(&err.to_string()).unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// Extract the message from an OpenAI-style error body.
///
/// Checks `{"error": {"message": ...}}` first, then a top-level `message`.
#[must_use]
pub fn extract_error_message(json: &Value) -> Option<String> {
    json.get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .and_then(non_blank)
        .or_else(|| json.get("message").and_then(Value::as_str).and_then(non_blank))
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
