//! Error types for the API client

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
///
/// Transport failures, non-2xx responses and undecodable bodies are kept
/// apart so callers can branch on what actually went wrong.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request could not complete (DNS, connect, aborted, body read)
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("API error ({status} {status_text}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        status_text: String,
        /// Server message, or the body text when no message was given
        message: String,
        /// Error body as sent by the server, if it was JSON
        payload: Option<serde_json::Value>,
    },

    /// Response arrived but its body could not be decoded
    #[error("Failed to decode response body as {expected}: {message}")]
    Decode {
        /// Shape the caller asked for
        expected: String,
        /// Decoder message
        message: String,
    },

    /// Request body could not be serialized
    #[error("Failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Route template is malformed
    #[error("Invalid route template '{template}': {reason}")]
    InvalidRoute {
        /// Offending template
        template: String,
        /// What is wrong with it
        reason: String,
    },

    /// Header name or value is not valid HTTP
    #[error("Invalid header '{0}'")]
    InvalidHeader(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing env var error
    pub fn missing_env(var: impl Into<String>) -> Self {
        Self::MissingEnvVar(var.into())
    }

    /// Create a decode error
    pub fn decode(expected: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            expected: expected.into(),
            message: message.to_string(),
        }
    }

    /// Create an invalid route error
    pub fn invalid_route(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRoute {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Build a status error from a failed response body.
    ///
    /// A JSON body is kept verbatim in `payload`; its `message` field, when
    /// present, becomes the error message.
    pub fn from_status(status: u16, status_text: impl Into<String>, body: &[u8]) -> Self {
        let status_text = status_text.into();
        let payload = serde_json::from_slice::<serde_json::Value>(body).ok();

        let message = payload
            .as_ref()
            .and_then(|p| p.get("message"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| status_text.clone());

        Self::Status {
            status,
            status_text,
            message,
            payload,
        }
    }

    /// HTTP status code, if the server answered
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw JSON error body sent by the server
    #[must_use]
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Status { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }

    /// Typed view of the server error payload
    #[must_use]
    pub fn server_error(&self) -> Option<WrappedException> {
        self.payload()
            .and_then(|p| serde_json::from_value(p.clone()).ok())
    }

    /// Check if the server answered 404
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status >= 500)
    }
}

/// Error payload returned by the services on failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedException {
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
    /// Fully-qualified server exception type
    #[serde(default)]
    pub type_name: Option<String>,
    /// Short exception key, stable across releases
    #[serde(default)]
    pub type_key: Option<String>,
    /// Numeric error code
    #[serde(default)]
    pub error_code: Option<i32>,
    /// Server event id
    #[serde(default)]
    pub event_id: Option<i32>,
    /// Nested cause
    #[serde(default)]
    pub inner_exception: Option<Box<WrappedException>>,
}
