//! Per-user session state: tokens, chat log, conversation.
//!
//! Created on login, cleared on logout. The orchestrator owns one and hands
//! out read-only snapshots to display surfaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tokens::{ExchangeResult, TokenBundle, TokenStore};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Entry in the append-only chat log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Mutable state of one signed-in user
#[derive(Debug, Clone)]
pub struct SessionState {
    tokens: TokenStore,
    messages: Vec<ChatMessage>,
    conversation_id: Option<String>,
    // Bumped on every login/logout so late replies can tell the session
    // they belong to is gone.
    epoch: u64,
}

impl SessionState {
    pub fn new(default_scope: impl Into<String>) -> Self {
        Self {
            tokens: TokenStore::new(default_scope),
            messages: Vec::new(),
            conversation_id: None,
            epoch: 0,
        }
    }

    /// Start a fresh session for `identity_token`
    pub fn start(&mut self, identity_token: &str) {
        self.clear();
        self.tokens.initialize(identity_token);
    }

    /// Drop tokens, log, and conversation
    pub fn clear(&mut self) {
        self.tokens.clear();
        self.messages.clear();
        self.conversation_id = None;
        self.epoch += 1;
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn tokens(&self) -> Option<TokenBundle> {
        self.tokens.current()
    }

    pub fn identity_token(&self) -> Option<&str> {
        self.tokens.identity_raw()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tokens.has_identity()
    }

    pub fn apply_exchange_result(&mut self, result: ExchangeResult) {
        self.tokens.apply_exchange_result(result);
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn set_conversation_id(&mut self, id: Option<String>) {
        if id.is_some() {
            self.conversation_id = id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_resets_everything() {
        let mut session = SessionState::new("mcp:read");
        session.start("a.b.c");
        session.append(ChatMessage::user("hi"));
        session.set_conversation_id(Some("conv-1".into()));
        let epoch = session.epoch();

        session.start("d.e.f");
        assert!(session.messages().is_empty());
        assert!(session.conversation_id().is_none());
        assert_eq!(session.identity_token(), Some("d.e.f"));
        assert!(session.epoch() > epoch);
    }

    #[test]
    fn test_clear_signs_out() {
        let mut session = SessionState::new("mcp:read");
        session.start("a.b.c");
        session.clear();
        assert!(!session.is_signed_in());
        assert!(session.tokens().is_none());
    }

    #[test]
    fn test_log_is_ordered() {
        let mut session = SessionState::new("");
        session.append(ChatMessage::user("one"));
        session.append(ChatMessage::assistant("two"));

        let roles: Vec<MessageRole> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant]);
        assert_ne!(session.messages()[0].id, session.messages()[1].id);
    }

    #[test]
    fn test_missing_conversation_id_keeps_previous() {
        let mut session = SessionState::new("");
        session.set_conversation_id(Some("conv-1".into()));
        session.set_conversation_id(None);
        assert_eq!(session.conversation_id(), Some("conv-1"));
    }

    #[test]
    fn test_message_serializes_role_snake_case() {
        let json = serde_json::to_value(ChatMessage::assistant("ok")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "ok");
    }
}
