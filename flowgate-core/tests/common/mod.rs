//! Common test utilities shared across test files.
//!
//! Items here may not be used by all test files, hence the module-level allow.
#![allow(dead_code)]

use async_trait::async_trait;
use flowgate_core::{
    codec, ChatCollaborator, ChatReply, ChatTurn, CollaboratorError, ExchangeResult, FlowConfig,
    FlowEvent, FlowHook, FlowStep, Orchestrator, StepStatus, ToolInvocation, ToolStatus,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PACING: Duration = Duration::from_millis(100);

// ===== Scripted Collaborator =====

/// Replays queued results, optionally after a delay, and records turns.
#[derive(Clone, Default)]
pub struct ScriptedCollaborator {
    script: Arc<Mutex<VecDeque<(Duration, Result<ChatReply, CollaboratorError>)>>>,
    turns: Arc<Mutex<Vec<ChatTurn>>>,
}

impl ScriptedCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: ChatReply) -> Self {
        self.reply_after(Duration::ZERO, reply)
    }

    pub fn reply_after(self, delay: Duration, reply: ChatReply) -> Self {
        self.script.lock().unwrap().push_back((delay, Ok(reply)));
        self
    }

    pub fn fail(self, error: CollaboratorError) -> Self {
        self.fail_after(Duration::ZERO, error)
    }

    pub fn fail_after(self, delay: Duration, error: CollaboratorError) -> Self {
        self.script.lock().unwrap().push_back((delay, Err(error)));
        self
    }

    pub fn turns(&self) -> Vec<ChatTurn> {
        self.turns.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCollaborator for ScriptedCollaborator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, turn: ChatTurn) -> Result<ChatReply, CollaboratorError> {
        self.turns.lock().unwrap().push(turn);
        let next = self.script.lock().unwrap().pop_front();
        let (delay, result) = next.unwrap_or_else(|| {
            (
                Duration::ZERO,
                Err(CollaboratorError::Other("script exhausted".to_string())),
            )
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

// ===== Event Log =====

#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<FlowEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.lock().unwrap().clone()
    }

    /// (generation, ordinal, status) of every step change, in order
    pub fn step_changes(&self) -> Vec<(u64, u32, StepStatus)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                FlowEvent::StepChanged {
                    generation,
                    ordinal,
                    status,
                    ..
                } => Some((generation, ordinal, status)),
                _ => None,
            })
            .collect()
    }
}

impl FlowHook for EventLog {
    fn on_event(&self, event: &FlowEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ===== Fixtures =====

pub fn id_token(sub: &str) -> String {
    codec::encode_unsigned(
        &json!({"alg": "RS256", "kid": "test"}),
        &json!({"sub": sub, "email": format!("{}@example.com", sub), "exp": 1_900_000_000}),
        "signature",
    )
}

pub fn exchange() -> ExchangeResult {
    ExchangeResult {
        delegation_token: Some(codec::encode_unsigned(
            &json!({"alg": "RS256", "typ": "oauth-id-jag+jwt"}),
            &json!({"sub": "alice", "aud": "mcp-server"}),
            "sig",
        )),
        access_token: Some("mcp_at_0123".to_string()),
        scope: Some("mcp:read".to_string()),
        audience: Some("api://mcp-server".to_string()),
        expires_in: Some(3600),
    }
}

/// Reply for a completed exchange and tool call
pub fn granted(text: &str, tool: &str) -> ChatReply {
    ChatReply::text(text)
        .with_exchange(exchange())
        .with_tool_call(ToolInvocation::new(tool, ToolStatus::Completed))
        .with_conversation_id("conv-1")
}

pub fn config() -> FlowConfig {
    FlowConfig::builder().pacing(PACING).build()
}

/// Orchestrator with a signed-in session
pub fn signed_in(collaborator: ScriptedCollaborator) -> Orchestrator {
    let orchestrator = Orchestrator::new(collaborator, config());
    orchestrator.login(&id_token("alice")).unwrap();
    orchestrator
}

pub fn statuses(steps: &[FlowStep]) -> Vec<StepStatus> {
    steps.iter().map(|s| s.status).collect()
}
