//! Request orchestration
//!
//! The [`Orchestrator`] ties the pieces together: it owns the session state,
//! drives the flow sequencer, and talks to the chat collaborator.

mod submit;
mod types;

pub use types::{DisplaySnapshot, SubmitReport};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::collaborator::ChatCollaborator;
use crate::config::FlowConfig;
use crate::error::{Error, Result};
use crate::events::{FlowEvent, FlowHook, HookId, HookRegistry};
use crate::sequencer::FlowSequencer;
use crate::session::{ChatMessage, SessionState};
use crate::tokens::TokenBundle;

/// Coordinates a user session with its collaborator and flow sequencer
///
/// # Example
///
/// ```no_run
/// use flowgate_core::{FlowConfig, Orchestrator, SimulatedCollaborator};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let orchestrator = Orchestrator::new(SimulatedCollaborator::new(), FlowConfig::default());
///     orchestrator.login("eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJ1MSJ9.sig")?;
///
///     let report = orchestrator.submit("Get customer information for Alice").await;
///     println!("{:?}", report.outcome);
///
///     let steps = orchestrator.sequencer().wait_settled().await.steps;
///     for step in steps {
///         println!("{} {}", step.title, step.status);
///     }
///     Ok(())
/// }
/// ```
pub struct Orchestrator {
    collaborator: Arc<dyn ChatCollaborator>,
    config: FlowConfig,
    session: RwLock<SessionState>,
    sequencer: FlowSequencer,
    hooks: HookRegistry,
    in_flight: AtomicUsize,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("collaborator", &self.collaborator.name())
            .field("config", &self.config)
            .field("sequencer", &self.sequencer)
            .field("busy", &self.is_busy())
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator with no session
    pub fn new(collaborator: impl ChatCollaborator + 'static, config: FlowConfig) -> Self {
        Self::from_arc(Arc::new(collaborator), config)
    }

    /// Create an orchestrator from a shared collaborator
    pub fn from_arc(collaborator: Arc<dyn ChatCollaborator>, config: FlowConfig) -> Self {
        let hooks = HookRegistry::default();
        let sequencer =
            FlowSequencer::with_hooks(config.step_set().clone(), config.pacing(), hooks.clone());
        let session = SessionState::new(config.requested_scope());

        Self {
            collaborator,
            config,
            session: RwLock::new(session),
            sequencer,
            hooks,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Add an event hook
    ///
    /// Hooks see orchestrator and sequencer events. They run synchronously
    /// on the emitting task, so keep them short.
    pub fn add_hook(&self, hook: impl FlowHook + 'static) -> HookId {
        self.hooks.add(hook)
    }

    /// Remove a previously added hook. Returns false if it was not registered.
    pub fn remove_hook(&self, id: HookId) -> bool {
        self.hooks.remove(id)
    }

    pub(crate) fn emit_event(&self, event: FlowEvent) {
        self.hooks.emit(event);
    }

    /// Start a fresh session for `identity_token`
    ///
    /// Clears the chat log, conversation, and any delegation/access tokens
    /// from a previous session, and resets the flow.
    pub fn login(&self, identity_token: &str) -> Result<()> {
        let identity_token = identity_token.trim();
        if identity_token.is_empty() {
            return Err(Error::Session("identity token is empty".to_string()));
        }

        let subject = {
            let mut session = self.session.write();
            session.start(identity_token);
            session
                .tokens()
                .and_then(|bundle| bundle.identity.subject().map(str::to_string))
        };
        log::info!("session started (sub={:?})", subject);

        self.sequencer.reset();
        self.emit_event(FlowEvent::SessionStarted { subject });
        Ok(())
    }

    /// End the session and reset the flow
    pub fn logout(&self) {
        self.session.write().clear();
        log::info!("session ended");

        self.sequencer.reset();
        self.emit_event(FlowEvent::SessionEnded);
    }

    /// Return every step to pending, voiding any run in progress
    pub fn reset_flow(&self) {
        self.sequencer.reset();
    }

    /// Current state for rendering
    pub fn snapshot(&self) -> DisplaySnapshot {
        let session = self.session.read();
        DisplaySnapshot {
            tokens: session.tokens(),
            steps: self.sequencer.steps(),
            messages: session.messages().to_vec(),
            busy: self.is_busy(),
            conversation_id: session.conversation_id().map(str::to_string),
        }
    }

    pub fn tokens(&self) -> Option<TokenBundle> {
        self.session.read().tokens()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.session.read().messages().to_vec()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.read().is_signed_in()
    }

    /// True while at least one submit is in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn sequencer(&self) -> &FlowSequencer {
        &self.sequencer
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn collaborator_name(&self) -> &str {
        self.collaborator.name()
    }
}

/// Marks the orchestrator busy until dropped
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
