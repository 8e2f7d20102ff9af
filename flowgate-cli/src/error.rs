//! CLI-specific error types

use thiserror::Error;

/// Errors that can occur while running the terminal surface
#[derive(Debug, Error)]
pub enum CliError {
    /// Orchestrator error (login, configuration)
    #[error("Flow error: {0}")]
    Flow(#[from] flowgate_core::Error),

    /// Collaborator could not be constructed
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] flowgate_core::CollaboratorError),

    /// Chat client could not be configured
    #[error("Chat API error: {0}")]
    ChatApi(#[from] flowgate_chat_sdk::ChatApiError),

    /// Readline/input error
    #[error("Input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    /// IO error (stdout, terminal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
