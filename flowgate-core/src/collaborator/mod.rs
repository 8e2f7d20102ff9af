//! Chat collaborators
//!
//! This module contains the `ChatCollaborator` trait and the backends the
//! orchestrator can talk to: the HTTP chat endpoint (behind the `http`
//! feature) and an offline simulation.

#[cfg(feature = "http")]
pub mod http;
pub mod simulated;

#[cfg(feature = "http")]
pub use http::HttpCollaborator;
pub use simulated::SimulatedCollaborator;

use serde::Serialize;
use std::sync::Arc;

use crate::classifier::RiskLevel;
use crate::tokens::ExchangeResult;

/// Error types for chat collaborators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// Connection, DNS, or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    /// Reply could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Identity or access token rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Collaborator misconfigured (missing URL, bad header value)
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl CollaboratorError {
    /// Returns true if the same call may succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// Short sentence suitable for showing to the user in the chat log
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "I couldn't reach the assistant service. Please check your connection and try again."
                    .to_string()
            }
            Self::Unauthorized(_) => {
                "Your session was rejected by the assistant service. Please sign in again."
                    .to_string()
            }
            other => format!("Sorry, I encountered an error: {}", other),
        }
    }
}

/// One user message sent to the collaborator
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ChatTurn {
    pub message: String,
    /// Conversation to continue, if one was returned earlier
    pub conversation_id: Option<String>,
    /// Caller's identity token, sent out of band
    pub identity_token: Option<String>,
}

impl std::fmt::Debug for ChatTurn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatTurn")
            .field("message", &self.message)
            .field("conversation_id", &self.conversation_id)
            .field(
                "identity_token",
                &self.identity_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ChatTurn {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn identity_token(mut self, token: impl Into<String>) -> Self {
        self.identity_token = Some(token.into());
        self
    }
}

/// Status of a tool call as reported by the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Pending,
    Allowed,
    Denied,
    RequiresApproval,
    Completed,
    Failed,
}

impl ToolStatus {
    /// `Denied` or `Failed`
    pub fn is_blocked(&self) -> bool {
        matches!(self, ToolStatus::Denied | ToolStatus::Failed)
    }
}

/// A tool call reported by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInvocation {
    pub name: String,
    pub status: ToolStatus,
    pub risk: RiskLevel,
    pub requires_approval: bool,
    pub approval_reason: Option<String>,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, status: ToolStatus) -> Self {
        let name = name.into();
        Self {
            risk: crate::classifier::risk_for_tool(&name),
            name,
            status,
            requires_approval: false,
            approval_reason: None,
        }
    }
}

/// Collaborator reply
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    /// Assistant text
    pub text: String,
    pub conversation_id: Option<String>,
    /// Exchange fields, present when the reply carried them
    pub exchange: Option<ExchangeResult>,
    /// The collaborator's own claim that the exchange happened
    pub token_exchanged: bool,
    /// Fine-grained authorization check reported a denial
    pub access_denied: bool,
    pub tool_calls: Vec<ToolInvocation>,
    pub audit_id: Option<String>,
}

impl ChatReply {
    /// Plain reply with no exchange and no tool calls
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            conversation_id: None,
            exchange: None,
            token_exchanged: false,
            access_denied: false,
            tool_calls: Vec::new(),
            audit_id: None,
        }
    }

    /// Attach exchange fields and mark the exchange performed
    pub fn with_exchange(mut self, exchange: ExchangeResult) -> Self {
        self.exchange = Some(exchange);
        self.token_exchanged = true;
        self
    }

    pub fn with_tool_call(mut self, call: ToolInvocation) -> Self {
        self.tool_calls.push(call);
        self
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn denied(mut self) -> Self {
        self.access_denied = true;
        self
    }

    /// True when the collaborator claims an exchange and reported a
    /// delegation token for it.
    pub fn exchange_performed(&self) -> bool {
        self.token_exchanged
            && self
                .exchange
                .as_ref()
                .is_some_and(ExchangeResult::is_performed)
    }

    /// Name of the first reported tool
    pub fn first_tool(&self) -> Option<&str> {
        self.tool_calls.first().map(|c| c.name.as_str())
    }
}

/// Trait for chat collaborators
///
/// A collaborator receives the user's message and identity token, performs
/// the token exchange on the agent's behalf, and reports the outcome. The
/// orchestrator works with any implementation.
#[async_trait::async_trait]
pub trait ChatCollaborator: Send + Sync {
    /// Name for display and logs
    fn name(&self) -> &str;

    /// Send one turn and wait for the reply
    async fn send(&self, turn: ChatTurn) -> Result<ChatReply, CollaboratorError>;
}

#[async_trait::async_trait]
impl ChatCollaborator for Arc<dyn ChatCollaborator> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn send(&self, turn: ChatTurn) -> Result<ChatReply, CollaboratorError> {
        (**self).send(turn).await
    }
}
