//! Error types for the chat SDK

use thiserror::Error;

use crate::chat::ErrorDetail;

/// Errors that can occur when calling the chat endpoint
#[derive(Debug, Error)]
pub enum ChatApiError {
    /// Credentials were rejected (401)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Caller is authenticated but not allowed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Rate limited by the backend (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Backend failed or is unavailable (5xx)
    #[error("Service unavailable: {message}")]
    ServiceUnavailable { status: u16, message: String },

    /// Request was rejected as malformed (400, 404, 422)
    #[error("Invalid request: {message}")]
    InvalidRequest { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Connection, DNS, or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Client misconfiguration (missing base URL, bad header value)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl ChatApiError {
    /// Returns true if the request never produced an HTTP response
    pub fn is_network(&self) -> bool {
        matches!(self, ChatApiError::Network(_))
    }

    /// Returns true if the backend reported a failure on its side
    pub fn is_server_side(&self) -> bool {
        matches!(
            self,
            ChatApiError::ServiceUnavailable { .. } | ChatApiError::RateLimited(_)
        )
    }

    /// HTTP status code this error was classified from, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ChatApiError::Authentication(_) => Some(401),
            ChatApiError::Forbidden(_) => Some(403),
            ChatApiError::RateLimited(_) => Some(429),
            ChatApiError::ServiceUnavailable { status, .. }
            | ChatApiError::InvalidRequest { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a non-2xx response
    ///
    /// Bodies shaped like `{"detail": ...}` are unwrapped into the message;
    /// anything else is passed through verbatim.
    pub fn from_status(status_code: u16, body: &str) -> Self {
        let msg = error_message(body, status_code);

        match status_code {
            401 => ChatApiError::Authentication(msg),
            403 => ChatApiError::Forbidden(msg),
            429 => ChatApiError::RateLimited(msg),
            400 | 404 | 422 => ChatApiError::InvalidRequest {
                status: status_code,
                message: msg,
            },
            500..=599 => ChatApiError::ServiceUnavailable {
                status: status_code,
                message: msg,
            },
            _ => ChatApiError::Other(msg),
        }
    }

    /// Classify an HTTP transport error
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatApiError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ChatApiError::Network(format!("Connection failed: {}", err))
        } else if err.is_request() {
            ChatApiError::Network(format!("Request failed: {}", err))
        } else if err.is_decode() {
            ChatApiError::InvalidResponse(err.to_string())
        } else {
            ChatApiError::Other(err.to_string())
        }
    }
}

fn error_message(body: &str, status_code: u16) -> String {
    if let Ok(error) = serde_json::from_str::<ErrorDetail>(body) {
        return match error.detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
    }

    if body.trim().is_empty() {
        format!("HTTP {}", status_code)
    } else {
        body.to_string()
    }
}
