use serde::Serialize;

use crate::classifier::OperationKind;
use crate::sequencer::{FlowOutcome, FlowStep};
use crate::session::ChatMessage;
use crate::tokens::TokenBundle;

/// Summary of one `submit()` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReport {
    /// Classifier result for the input text
    pub kind: OperationKind,
    /// Label passed to the terminal sequencer run
    pub tool_label: String,
    /// Terminal outcome asserted on the sequencer
    pub outcome: FlowOutcome,
    /// Generation of the terminal run
    pub generation: u64,
    /// Whether the collaborator reported a completed exchange
    pub exchange_performed: bool,
    /// Collaborator error, if the call failed
    pub error: Option<String>,
}

impl SubmitReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Everything a display surface renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySnapshot {
    pub tokens: Option<TokenBundle>,
    pub steps: Vec<FlowStep>,
    pub messages: Vec<ChatMessage>,
    /// True while any submit is awaiting the collaborator
    pub busy: bool,
    pub conversation_id: Option<String>,
}
