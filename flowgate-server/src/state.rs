//! Application state for the flowgate server.

use std::sync::Arc;

use flowgate_core::Orchestrator;

/// Shared application state containing the orchestrator.
///
/// One orchestrator holds one session, so every client of a server sees
/// and drives the same flow.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn from_arc(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}
