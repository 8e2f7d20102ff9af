//! # Flowgate
//!
//! Orchestration for delegated authorization: an AI agent acting for a
//! signed-in user trades the user's identity token for a delegation grant
//! and then a scoped access token before it may call a backend tool.
//!
//! Flowgate drives and visualizes that chain. It decodes and holds the
//! tokens, classifies each request, paces an ordered set of flow steps, and
//! reconciles them with whatever the chat backend actually reports.
//!
//! ## Quick Start
//!
//! ```no_run
//! use flowgate_core::{FlowConfig, Orchestrator, SimulatedCollaborator};
//!
//! #[tokio::main]
//! async fn main() -> flowgate_core::Result<()> {
//!     let orchestrator = Orchestrator::new(SimulatedCollaborator::new(), FlowConfig::from_env()?);
//!     orchestrator.login("eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJ1MSJ9.sig")?;
//!
//!     let report = orchestrator.submit("Initiate a payment of $15000 to Bob").await;
//!     println!("{} via {}: {:?}", report.kind, report.tool_label, report.outcome);
//!
//!     let snapshot = orchestrator.snapshot();
//!     println!("{} messages", snapshot.messages.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Observing the flow
//!
//! Register a [`FlowHook`] (any `Fn(&FlowEvent)` works) to follow step
//! transitions as they happen:
//!
//! ```no_run
//! use flowgate_core::{FlowConfig, FlowEvent, Orchestrator, SimulatedCollaborator};
//!
//! let orchestrator = Orchestrator::new(SimulatedCollaborator::new(), FlowConfig::default());
//! orchestrator.add_hook(|event: &FlowEvent| {
//!     if let FlowEvent::StepChanged { title, status, .. } = event {
//!         println!("{title}: {status}");
//!     }
//! });
//! ```
//!
//! ## Feature Flags
//!
//! - `http` - [`HttpCollaborator`] for the chat HTTP endpoint
//! - `test-utils` - Scripted collaborator and event collector for tests

pub mod classifier;
pub mod codec;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod sequencer;
pub mod session;
pub mod tokens;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use classifier::{classify, risk_for_tool, OperationKind, RiskLevel};
pub use collaborator::{
    ChatCollaborator, ChatReply, ChatTurn, CollaboratorError, SimulatedCollaborator,
    ToolInvocation, ToolStatus,
};
#[cfg(feature = "http")]
pub use collaborator::HttpCollaborator;
pub use config::{FlowConfig, FlowConfigBuilder};
pub use error::{Error, Result};
pub use events::{FlowEvent, FlowHook, HookId};
pub use orchestrator::{DisplaySnapshot, Orchestrator, SubmitReport};
pub use sequencer::{
    FlowOutcome, FlowSequencer, FlowSnapshot, FlowStage, FlowStep, StepGroup, StepSet,
    StepStatus, StepTemplate,
};
pub use session::{ChatMessage, MessageRole, SessionState};
pub use tokens::{
    DelegationToken, ExchangeResult, IdentityToken, ScopedAccessToken, TokenBundle, TokenStore,
};
