//! Top-level error types for flowgate
//!
//! Submitting a message never fails: collaborator failures become an
//! assistant message and a failed flow. This type covers the operations a
//! caller can get wrong (configuration, session handling) and lets
//! collaborator errors be propagated when a caller talks to one directly.

use thiserror::Error;

use crate::collaborator::CollaboratorError;

/// Top-level error type for flowgate operations
///
/// - [`Error::Collaborator`] - The chat backend could not be reached or rejected the call
/// - [`Error::Session`] - Operation needs a session that does not exist
/// - [`Error::Config`] - Fix configuration (bad interval, empty step set)
#[derive(Debug, Error)]
pub enum Error {
    /// Chat collaborator failed
    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Session missing or invalid
    #[error("session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if this is a collaborator error
    pub fn is_collaborator(&self) -> bool {
        matches!(self, Self::Collaborator(_))
    }

    /// Returns true if this is a session error
    pub fn is_session(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    /// Returns true if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Collaborator(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result type for flowgate operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(Error::Config("bad".into()).is_config());
        assert!(Error::Session("none".into()).is_session());
        assert!(!Error::Session("none".into()).is_config());
    }

    #[test]
    fn test_from_collaborator_error() {
        let err: Error = CollaboratorError::Network("refused".into()).into();
        assert!(err.is_collaborator());
        assert!(err.is_retryable());

        let err: Error = CollaboratorError::Unauthorized("expired".into()).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_display() {
        let err: Error = CollaboratorError::Status {
            code: 500,
            message: "boom".into(),
        }
        .into();
        assert_eq!(err.to_string(), "collaborator error: HTTP 500: boom");
        assert_eq!(
            Error::Config("FLOWGATE_STEP_INTERVAL_MS must be an integer".into()).to_string(),
            "configuration error: FLOWGATE_STEP_INTERVAL_MS must be an integer"
        );
    }
}
