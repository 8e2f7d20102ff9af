//! Flow step records and the step sets they are built from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder replaced with the tool label when a step set is instantiated
pub const TOOL_PLACEHOLDER: &str = "{tool}";

/// Display state of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Active,
    Complete,
    Error,
}

impl StepStatus {
    /// `Complete` or `Error`
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Complete | StepStatus::Error)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::Active => "active",
            StepStatus::Complete => "complete",
            StepStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Visual grouping of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepGroup {
    Primary,
    Secondary,
}

/// Point in the authorization chain a step represents.
///
/// Ordered: a failure at a stage is surfaced at the first step whose stage is
/// at or after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    /// The user's own identity token
    Identity,
    /// Identity token traded for a delegation grant
    Delegation,
    /// Delegation grant traded for a scoped access token
    AccessGrant,
    /// The tool call authorized by the access token
    ToolCall,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowStage::Identity => "identity",
            FlowStage::Delegation => "delegation",
            FlowStage::AccessGrant => "access_grant",
            FlowStage::ToolCall => "tool_call",
        };
        f.write_str(s)
    }
}

/// Terminal outcome asserted by a sequencer run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FlowOutcome {
    Success,
    /// The chain broke at `stage`
    Failure { stage: FlowStage },
}

impl FlowOutcome {
    pub fn failure(stage: FlowStage) -> Self {
        FlowOutcome::Failure { stage }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FlowOutcome::Success)
    }

    pub fn failed_stage(&self) -> Option<FlowStage> {
        match self {
            FlowOutcome::Success => None,
            FlowOutcome::Failure { stage } => Some(*stage),
        }
    }
}

/// One visible stage of the exchange/authorization sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    /// 1-based position in the flow
    pub ordinal: u32,
    pub title: String,
    pub description: String,
    pub status: StepStatus,
    pub group: StepGroup,
    pub stage: FlowStage,
}

/// Blueprint for a [`FlowStep`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTemplate {
    pub title: String,
    /// May contain [`TOOL_PLACEHOLDER`]
    pub description: String,
    pub group: StepGroup,
    pub stage: FlowStage,
}

impl StepTemplate {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        group: StepGroup,
        stage: FlowStage,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            group,
            stage,
        }
    }
}

/// Ordered list of step templates a flow is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSet {
    templates: Vec<StepTemplate>,
}

impl Default for StepSet {
    fn default() -> Self {
        Self::reference()
    }
}

impl StepSet {
    pub fn new(templates: Vec<StepTemplate>) -> Self {
        Self { templates }
    }

    /// Four-step flow: two primary identity steps, two secondary grant steps.
    pub fn reference() -> Self {
        Self::new(vec![
            StepTemplate::new(
                "User Authentication",
                "User signs in and receives an ID token",
                StepGroup::Primary,
                FlowStage::Identity,
            ),
            StepTemplate::new(
                "ID-JAG Exchange",
                "Agent exchanges the ID token for an identity assertion grant",
                StepGroup::Primary,
                FlowStage::Delegation,
            ),
            StepTemplate::new(
                "Access Token Issued",
                "Authorization server issues a scoped access token",
                StepGroup::Secondary,
                FlowStage::AccessGrant,
            ),
            StepTemplate::new(
                "Tool Authorization",
                "Access token authorizes {tool}",
                StepGroup::Secondary,
                FlowStage::ToolCall,
            ),
        ])
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn templates(&self) -> &[StepTemplate] {
        &self.templates
    }

    /// Build fresh, all-pending steps with `tool_label` substituted in.
    pub fn instantiate(&self, tool_label: &str) -> Vec<FlowStep> {
        self.templates
            .iter()
            .enumerate()
            .map(|(i, t)| FlowStep {
                ordinal: i as u32 + 1,
                title: t.title.clone(),
                description: t.description.replace(TOOL_PLACEHOLDER, tool_label),
                status: StepStatus::Pending,
                group: t.group,
                stage: t.stage,
            })
            .collect()
    }

    /// Index of the step where a failure at `stage` is surfaced.
    ///
    /// The first step whose stage is at or after `stage`, else the last step.
    /// `None` only for an empty set.
    pub fn halt_index(&self, stage: FlowStage) -> Option<usize> {
        self.templates
            .iter()
            .position(|t| t.stage >= stage)
            .or_else(|| self.templates.len().checked_sub(1))
    }
}
