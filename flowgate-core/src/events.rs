use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::classifier::OperationKind;
use crate::sequencer::{FlowOutcome, StepStatus};
use crate::session::ChatMessage;

/// Events emitted while a session runs
///
/// These events allow observers (display surfaces, loggers, tests) to follow
/// submits, collaborator calls, token updates, and step transitions as they
/// happen.
#[derive(Debug, Clone)]
pub enum FlowEvent {
    // ===== Session Lifecycle =====
    /// A new identity token was stored
    SessionStarted {
        /// `sub` claim of the identity token, if it decoded
        subject: Option<String>,
    },

    /// Tokens, log, and conversation cleared
    SessionEnded,

    // ===== Submit Lifecycle =====
    /// submit() accepted a message
    SubmitStarted {
        /// User input
        text: String,
        /// Classifier result
        kind: OperationKind,
        /// Timestamp
        timestamp: Instant,
    },

    /// submit() finished, whatever the outcome
    SubmitCompleted {
        /// Terminal outcome asserted on the sequencer
        outcome: FlowOutcome,
        /// Total duration
        duration: Duration,
    },

    // ===== Collaborator Call =====
    /// Request sent to the chat collaborator
    CollaboratorCallStarted {
        /// Collaborator name
        collaborator: String,
        /// Whether an identity token was attached
        with_identity: bool,
    },

    /// Collaborator answered
    CollaboratorCallCompleted {
        /// Whether the reply reports a completed exchange
        token_exchanged: bool,
        /// Number of tool calls reported
        tool_calls: usize,
        /// Call duration
        duration: Duration,
    },

    /// Collaborator call failed
    CollaboratorCallFailed {
        /// Error message
        error: String,
        /// How long before failure
        duration: Duration,
    },

    /// Delegation/access tokens replaced
    TokensUpdated {
        has_delegation: bool,
        has_access: bool,
    },

    // ===== Sequencer =====
    /// All steps returned to pending
    SequencerReset { generation: u64 },

    /// A run began advancing steps
    RunStarted {
        generation: u64,
        outcome: FlowOutcome,
        tool_label: String,
    },

    /// A step changed status
    StepChanged {
        generation: u64,
        ordinal: u32,
        title: String,
        status: StepStatus,
    },

    /// A run reached its terminal state without being superseded
    RunFinished {
        generation: u64,
        outcome: FlowOutcome,
    },

    // ===== Chat Log =====
    /// A message was appended to the chat log
    MessageAppended { message: ChatMessage },
}

/// Hook for observing flow events
///
/// # Example
/// ```
/// use flowgate_core::events::{FlowEvent, FlowHook};
///
/// struct StepPrinter;
///
/// impl FlowHook for StepPrinter {
///     fn on_event(&self, event: &FlowEvent) {
///         if let FlowEvent::StepChanged { title, status, .. } = event {
///             println!("{}: {}", title, status);
///         }
///     }
/// }
/// ```
pub trait FlowHook: Send + Sync {
    /// Called when an event occurs
    fn on_event(&self, event: &FlowEvent);
}

/// Blanket implementation for closures
impl<F> FlowHook for F
where
    F: Fn(&FlowEvent) + Send + Sync,
{
    fn on_event(&self, event: &FlowEvent) {
        self(event)
    }
}

/// Unique identifier for a registered hook.
///
/// Used to remove hooks via [`crate::Orchestrator::remove_hook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub(crate) u64);

/// Hook list shared by the orchestrator and its sequencer
#[derive(Clone, Default)]
pub(crate) struct HookRegistry {
    hooks: Arc<RwLock<Vec<(HookId, Arc<dyn FlowHook>)>>>,
    next_id: Arc<AtomicU64>,
}

impl HookRegistry {
    pub(crate) fn add(&self, hook: impl FlowHook + 'static) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.hooks.write().push((id, Arc::new(hook)));
        id
    }

    pub(crate) fn remove(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.write();
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() != before
    }

    /// Deliver `event` to every hook.
    ///
    /// Hooks run outside the lock, so a hook may register or remove hooks.
    pub(crate) fn emit(&self, event: FlowEvent) {
        let hooks: Vec<Arc<dyn FlowHook>> =
            self.hooks.read().iter().map(|(_, h)| Arc::clone(h)).collect();
        for hook in hooks {
            hook.on_event(&event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.hooks.read().len()
    }
}
