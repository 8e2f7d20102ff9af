//! Runtime configuration for the orchestrator.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::sequencer::StepSet;

/// Default interval between step transitions
pub const DEFAULT_PACING: Duration = Duration::from_millis(700);

/// Scope reported for an access token when the collaborator omits one
pub const DEFAULT_REQUESTED_SCOPE: &str = "mcp:read";

/// Environment variable overriding the pacing interval, in milliseconds
pub const STEP_INTERVAL_ENV: &str = "FLOWGATE_STEP_INTERVAL_MS";

/// Environment variable overriding the requested scope
pub const REQUESTED_SCOPE_ENV: &str = "FLOWGATE_REQUESTED_SCOPE";

/// Orchestrator configuration
///
/// ```
/// use flowgate_core::FlowConfig;
/// use std::time::Duration;
///
/// let config = FlowConfig::builder()
///     .pacing(Duration::from_millis(250))
///     .requested_scope("mcp:read mcp:write")
///     .build();
/// assert_eq!(config.pacing(), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    pacing: Duration,
    step_set: StepSet,
    requested_scope: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            step_set: StepSet::reference(),
            requested_scope: DEFAULT_REQUESTED_SCOPE.to_string(),
        }
    }
}

impl FlowConfig {
    pub fn builder() -> FlowConfigBuilder {
        FlowConfigBuilder::default()
    }

    /// Defaults overridden by `FLOWGATE_STEP_INTERVAL_MS` and
    /// `FLOWGATE_REQUESTED_SCOPE`, when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(raw) = lookup(STEP_INTERVAL_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a whole number of milliseconds, got {:?}",
                    STEP_INTERVAL_ENV, raw
                ))
            })?;
            builder = builder.pacing(Duration::from_millis(millis));
        }

        if let Some(scope) = lookup(REQUESTED_SCOPE_ENV) {
            if scope.trim().is_empty() {
                return Err(Error::Config(format!("{} is empty", REQUESTED_SCOPE_ENV)));
            }
            builder = builder.requested_scope(scope.trim());
        }

        Ok(builder.build())
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    pub fn step_set(&self) -> &StepSet {
        &self.step_set
    }

    pub fn requested_scope(&self) -> &str {
        &self.requested_scope
    }
}

/// Builder for [`FlowConfig`]
#[derive(Debug, Clone, Default)]
pub struct FlowConfigBuilder {
    config: FlowConfig,
}

impl FlowConfigBuilder {
    /// Interval each step stays `active` before its terminal status
    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.config.pacing = pacing;
        self
    }

    pub fn step_set(mut self, step_set: StepSet) -> Self {
        self.config.step_set = step_set;
        self
    }

    pub fn requested_scope(mut self, scope: impl Into<String>) -> Self {
        self.config.requested_scope = scope.into();
        self
    }

    pub fn build(self) -> FlowConfig {
        self.config
    }
}
