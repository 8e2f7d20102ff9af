//! Error types for the flowgate server.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Errors that can occur when building a router.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The API prefix is not an absolute path.
    #[error("API prefix must start with '/', got {0:?}")]
    InvalidPrefix(String),

    /// A CORS origin is not a valid header value.
    #[error("Invalid CORS origin: {0:?}")]
    InvalidOrigin(String),
}

/// Errors that can occur in the flowgate server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Error from the orchestrator.
    #[error("Flow error: {0}")]
    Flow(#[from] flowgate_core::Error),

    /// Invalid request from client.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::InvalidRequest(rejection.body_text())
    }
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Flow(e) if e.is_session() => StatusCode::BAD_REQUEST,
            ServerError::Flow(e) if e.is_collaborator() => StatusCode::BAD_GATEWAY,
            ServerError::Flow(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServerError::Flow(e) => e.to_string(),
            ServerError::InvalidRequest(e) => e.clone(),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
