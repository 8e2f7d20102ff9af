//! Test utilities for flowgate-core.
//!
//! This module provides a scripted collaborator and an event collector for
//! testing orchestration without a chat backend.
//!
//! Enable with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! flowgate-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! use flowgate_core::{ChatReply, FlowConfig, Orchestrator};
//! use flowgate_core::test_utils::{EventCollector, MockCollaborator};
//!
//! # async fn example() {
//! let collaborator = MockCollaborator::new().with_reply(ChatReply::text("Hello!"));
//! let orchestrator = Orchestrator::new(collaborator.clone(), FlowConfig::default());
//!
//! let collector = EventCollector::new();
//! orchestrator.add_hook(collector.clone());
//!
//! orchestrator.submit("Hi").await;
//! assert_eq!(collaborator.call_count(), 1);
//! assert!(collector.has_event("submit_completed"));
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::collaborator::{ChatCollaborator, ChatReply, ChatTurn, CollaboratorError};
use crate::events::{FlowEvent, FlowHook};
use crate::tokens::ExchangeResult;

struct Scripted {
    delay: Duration,
    result: Result<ChatReply, CollaboratorError>,
}

/// A scripted chat collaborator for testing.
///
/// Returns queued replies in order and records every turn it receives.
///
/// # Example
///
/// ```rust
/// use flowgate_core::test_utils::MockCollaborator;
/// use flowgate_core::CollaboratorError;
///
/// let collaborator = MockCollaborator::new()
///     .with_exchange("Alice is a customer", "get_customer")
///     .with_error(CollaboratorError::Network("connection refused".into()));
/// ```
#[derive(Clone, Default)]
pub struct MockCollaborator {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    turns: Arc<Mutex<Vec<ChatTurn>>>,
}

impl MockCollaborator {
    /// Create a collaborator with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply.
    pub fn with_reply(self, reply: ChatReply) -> Self {
        self.with_reply_after(Duration::ZERO, reply)
    }

    /// Queue a reply delivered after `delay`.
    pub fn with_reply_after(self, delay: Duration, reply: ChatReply) -> Self {
        self.push(delay, Ok(reply))
    }

    /// Queue a successful exchange that ran `tool` to completion.
    pub fn with_exchange(self, text: impl Into<String>, tool: &str) -> Self {
        let reply = ChatReply::text(text)
            .with_exchange(sample_exchange())
            .with_tool_call(crate::collaborator::ToolInvocation::new(
                tool,
                crate::collaborator::ToolStatus::Completed,
            ));
        self.with_reply(reply)
    }

    /// Queue a failure.
    pub fn with_error(self, error: CollaboratorError) -> Self {
        self.with_error_after(Duration::ZERO, error)
    }

    /// Queue a failure delivered after `delay`.
    pub fn with_error_after(self, delay: Duration, error: CollaboratorError) -> Self {
        self.push(delay, Err(error))
    }

    fn push(self, delay: Duration, result: Result<ChatReply, CollaboratorError>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted { delay, result });
        self
    }

    /// Number of `send` calls made.
    pub fn call_count(&self) -> usize {
        self.turns.lock().unwrap().len()
    }

    /// Turns received, in order.
    pub fn turns(&self) -> Vec<ChatTurn> {
        self.turns.lock().unwrap().clone()
    }
}

/// Exchange fields shaped like a real backend's reply
pub fn sample_exchange() -> ExchangeResult {
    ExchangeResult {
        delegation_token: Some(crate::codec::encode_unsigned(
            &serde_json::json!({"alg": "RS256", "typ": "oauth-id-jag+jwt"}),
            &serde_json::json!({"sub": "u1", "aud": "mcp-server", "scope": "mcp:read"}),
            "sig",
        )),
        access_token: Some("mcp_at_test".to_string()),
        scope: Some("mcp:read".to_string()),
        audience: Some("api://mcp-server".to_string()),
        expires_in: Some(3600),
    }
}

#[async_trait::async_trait]
impl ChatCollaborator for MockCollaborator {
    fn name(&self) -> &str {
        "MockCollaborator"
    }

    async fn send(&self, turn: ChatTurn) -> Result<ChatReply, CollaboratorError> {
        self.turns.lock().unwrap().push(turn);

        let next = self.script.lock().unwrap().pop_front();
        let Some(scripted) = next else {
            return Err(CollaboratorError::Other(
                "MockCollaborator: No more replies configured".to_string(),
            ));
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.result
    }
}

/// Collects flow events for verification in tests.
///
/// Clones share the same event list.
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<FlowEvent>>>,
}

impl EventCollector {
    /// Create a new event collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected events.
    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Get all collected event type names.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(Self::event_type_name)
            .collect()
    }

    /// Clear all collected events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Check if a specific event type was collected.
    pub fn has_event(&self, event_type: &str) -> bool {
        self.count_event(event_type) > 0
    }

    /// Count occurrences of a specific event type.
    pub fn count_event(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| Self::event_type_name(e) == event_type)
            .count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    fn event_type_name(event: &FlowEvent) -> &'static str {
        match event {
            FlowEvent::SessionStarted { .. } => "session_started",
            FlowEvent::SessionEnded => "session_ended",
            FlowEvent::SubmitStarted { .. } => "submit_started",
            FlowEvent::SubmitCompleted { .. } => "submit_completed",
            FlowEvent::CollaboratorCallStarted { .. } => "collaborator_call_started",
            FlowEvent::CollaboratorCallCompleted { .. } => "collaborator_call_completed",
            FlowEvent::CollaboratorCallFailed { .. } => "collaborator_call_failed",
            FlowEvent::TokensUpdated { .. } => "tokens_updated",
            FlowEvent::SequencerReset { .. } => "sequencer_reset",
            FlowEvent::RunStarted { .. } => "run_started",
            FlowEvent::StepChanged { .. } => "step_changed",
            FlowEvent::RunFinished { .. } => "run_finished",
            FlowEvent::MessageAppended { .. } => "message_appended",
        }
    }
}

impl FlowHook for EventCollector {
    fn on_event(&self, event: &FlowEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
