//! Timed state machine over the flow's steps.
//!
//! Every [`FlowSequencer::reset`] and [`FlowSequencer::start`] bumps a run
//! generation. A run task only mutates state while its generation is still
//! current, so transitions scheduled by a superseded run never land.

mod step;

pub use step::{
    FlowOutcome, FlowStage, FlowStep, StepGroup, StepSet, StepStatus, StepTemplate,
    TOOL_PLACEHOLDER,
};

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::events::{FlowEvent, HookRegistry};

/// Label used in step descriptions before any run has started
pub const IDLE_TOOL_LABEL: &str = "the requested tool";

/// Observable state of the sequencer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSnapshot {
    /// Run generation that produced this state
    pub generation: u64,
    pub steps: Vec<FlowStep>,
    /// True while a run still has transitions to apply
    pub running: bool,
}

impl FlowSnapshot {
    /// The step currently `active`, if any
    pub fn active_step(&self) -> Option<&FlowStep> {
        self.steps.iter().find(|s| s.status == StepStatus::Active)
    }

    pub fn all_pending(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Pending)
    }
}

struct Shared {
    state: watch::Sender<FlowSnapshot>,
    // Held while a generation is claimed so the handle stored always
    // belongs to the newest run.
    task: Mutex<Option<JoinHandle<()>>>,
    pacing: Duration,
    step_set: StepSet,
    hooks: HookRegistry,
}

/// Ordered step state machine with timed pacing.
///
/// Cloning yields another handle to the same sequencer.
///
/// ```
/// use std::time::Duration;
/// use flowgate_core::sequencer::{FlowOutcome, FlowSequencer, StepSet, StepStatus};
///
/// # tokio_test::block_on(async {
/// let sequencer = FlowSequencer::new(StepSet::reference(), Duration::from_millis(1));
/// sequencer.start(FlowOutcome::Success, "get_customer");
///
/// let settled = sequencer.wait_settled().await;
/// assert!(settled.steps.iter().all(|s| s.status == StepStatus::Complete));
/// # });
/// ```
#[derive(Clone)]
pub struct FlowSequencer {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for FlowSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowSequencer")
            .field("pacing", &self.shared.pacing)
            .field("steps", &self.shared.step_set.len())
            .field("generation", &self.generation())
            .finish()
    }
}

impl FlowSequencer {
    /// Create a sequencer with no hooks attached
    pub fn new(step_set: StepSet, pacing: Duration) -> Self {
        Self::with_hooks(step_set, pacing, HookRegistry::default())
    }

    pub(crate) fn with_hooks(step_set: StepSet, pacing: Duration, hooks: HookRegistry) -> Self {
        let initial = FlowSnapshot {
            generation: 0,
            steps: step_set.instantiate(IDLE_TOOL_LABEL),
            running: false,
        };
        let (state, _) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared {
                state,
                task: Mutex::new(None),
                pacing,
                step_set,
                hooks,
            }),
        }
    }

    /// Return every step to `pending` and void the in-flight run, if any.
    ///
    /// Safe to call at any time, including mid-run.
    pub fn reset(&self) {
        let generation = {
            let mut task = self.shared.task.lock();
            let mut generation = 0;
            self.shared.state.send_modify(|snap| {
                snap.generation += 1;
                generation = snap.generation;
                snap.running = false;
                for step in &mut snap.steps {
                    step.status = StepStatus::Pending;
                }
            });
            if let Some(handle) = task.take() {
                handle.abort();
            }
            generation
        };

        log::debug!("sequencer reset (generation {})", generation);
        self.shared
            .hooks
            .emit(FlowEvent::SequencerReset { generation });
    }

    /// Begin a run that advances steps in ordinal order and ends in `outcome`.
    ///
    /// Steps are rebuilt fresh (all `pending`) with `tool_label` substituted
    /// into their descriptions. Each step goes `active`, waits one pacing
    /// interval, then goes `complete`, or `error` if it is where the failure
    /// surfaces. After an `error` the remaining steps stay `pending`.
    ///
    /// Supersedes any earlier run. Returns the new run's generation.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, outcome: FlowOutcome, tool_label: &str) -> u64 {
        let halt_at = outcome
            .failed_stage()
            .and_then(|stage| self.shared.step_set.halt_index(stage));

        let mut task = self.shared.task.lock();
        let mut generation = 0;
        let steps = self.shared.step_set.instantiate(tool_label);
        self.shared.state.send_modify(|snap| {
            generation = snap.generation + 1;
            *snap = FlowSnapshot {
                generation,
                steps,
                running: true,
            };
        });
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let shared = Arc::clone(&self.shared);
        let tool_label = tool_label.to_string();
        *task = Some(tokio::spawn(async move {
            shared.run(generation, outcome, tool_label, halt_at).await;
        }));
        generation
    }

    /// Current state
    pub fn snapshot(&self) -> FlowSnapshot {
        self.shared.state.borrow().clone()
    }

    pub fn steps(&self) -> Vec<FlowStep> {
        self.shared.state.borrow().steps.clone()
    }

    pub fn generation(&self) -> u64 {
        self.shared.state.borrow().generation
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.borrow().running
    }

    pub fn pacing(&self) -> Duration {
        self.shared.pacing
    }

    pub fn step_set(&self) -> &StepSet {
        &self.shared.step_set
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<FlowSnapshot> {
        self.shared.state.subscribe()
    }

    /// Wait until no run is in progress and return the settled state.
    pub async fn wait_settled(&self) -> FlowSnapshot {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(|snap| !snap.running).await.map(|snap| snap.clone());
        // The sender lives as long as `self`, so the wait cannot fail
        settled.unwrap_or_else(|_| self.snapshot())
    }
}

impl Shared {
    async fn run(
        &self,
        generation: u64,
        outcome: FlowOutcome,
        tool_label: String,
        halt_at: Option<usize>,
    ) {
        if self.generation() != generation {
            return;
        }
        log::debug!(
            "sequencer run {} started: {:?} ({})",
            generation,
            outcome,
            tool_label
        );
        self.hooks.emit(FlowEvent::RunStarted {
            generation,
            outcome,
            tool_label,
        });

        for index in 0..self.step_set.len() {
            if !self.transition(generation, index, StepStatus::Active) {
                return;
            }

            tokio::time::sleep(self.pacing).await;

            let status = if halt_at == Some(index) {
                StepStatus::Error
            } else {
                StepStatus::Complete
            };
            if !self.transition(generation, index, status) {
                return;
            }
            if status == StepStatus::Error {
                break;
            }
        }

        self.finish(generation, outcome);
    }

    fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Apply a status change if `generation` is still current.
    fn transition(&self, generation: u64, index: usize, status: StepStatus) -> bool {
        let mut changed = None;
        self.state.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            let Some(step) = snap.steps.get_mut(index) else {
                return false;
            };
            step.status = status;
            changed = Some((step.ordinal, step.title.clone()));
            true
        });

        // A reset between the update and here voids the event too
        match changed.filter(|_| self.generation() == generation) {
            Some((ordinal, title)) => {
                log::trace!("run {} step {} -> {}", generation, ordinal, status);
                self.hooks.emit(FlowEvent::StepChanged {
                    generation,
                    ordinal,
                    title,
                    status,
                });
                true
            }
            None => {
                log::trace!("run {} superseded, dropping transition", generation);
                false
            }
        }
    }

    fn finish(&self, generation: u64, outcome: FlowOutcome) {
        let finished = self.state.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            snap.running = false;
            true
        });

        if finished {
            log::debug!("sequencer run {} finished: {:?}", generation, outcome);
            self.hooks
                .emit(FlowEvent::RunFinished { generation, outcome });
        }
    }
}
