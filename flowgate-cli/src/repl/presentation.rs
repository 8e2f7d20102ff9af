//! Live flow presentation for CLI output

use flowgate_core::{FlowEvent, FlowHook, FlowOutcome, FlowSequencer, StepStatus};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Queue for flow events that need to be printed
pub type EventQueue = Arc<Mutex<VecDeque<FlowEvent>>>;

/// Create a new event queue
pub fn new_event_queue() -> EventQueue {
    Arc::new(Mutex::new(VecDeque::new()))
}

fn lock(queue: &EventQueue) -> MutexGuard<'_, VecDeque<FlowEvent>> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Hook that queues step and token events for later presentation
///
/// Events are queued rather than printed immediately so nothing is written
/// over the spinner while the collaborator call is outstanding.
pub struct PresentationHook {
    queue: EventQueue,
}

impl PresentationHook {
    pub fn new(queue: EventQueue) -> Self {
        Self { queue }
    }
}

impl FlowHook for PresentationHook {
    fn on_event(&self, event: &FlowEvent) {
        match event {
            FlowEvent::StepChanged { .. } | FlowEvent::TokensUpdated { .. } => {
                lock(&self.queue).push_back(event.clone());
            }
            _ => {}
        }
    }
}

/// Prints queued events for one sequencer run
pub struct FlowPresenter {
    queue: EventQueue,
}

impl FlowPresenter {
    pub fn new(queue: EventQueue) -> Self {
        Self { queue }
    }

    /// Drain the queue, printing step changes of `generation` and token
    /// updates. Step changes from any other run are discarded, and so are
    /// those of `generation` once the sequencer has moved past it.
    pub fn flush(&self, sequencer: &FlowSequencer, generation: u64) -> usize {
        let lines = self.drain(generation, || sequencer.generation());
        for line in &lines {
            println!("{}", line);
        }
        lines.len()
    }

    fn drain(&self, generation: u64, current: impl FnOnce() -> u64) -> Vec<String> {
        let events: Vec<FlowEvent> = lock(&self.queue).drain(..).collect();
        // Checked after draining: a transition that slipped out after a reset
        // is already in `events`, and the reset is visible by now.
        let superseded = current() != generation;
        events
            .iter()
            .filter(|event| !(superseded && matches!(event, FlowEvent::StepChanged { .. })))
            .filter_map(|event| format_event(event, generation))
            .collect()
    }

    /// Discard everything queued so far
    pub fn discard(&self) {
        lock(&self.queue).clear();
    }

    /// Print step changes of run `generation` as they happen, until it
    /// settles or is superseded.
    pub async fn follow(&self, sequencer: &FlowSequencer, generation: u64, outcome: FlowOutcome) {
        let mut rx = sequencer.subscribe();
        loop {
            self.flush(sequencer, generation);
            let settled = {
                let snap = rx.borrow_and_update();
                !snap.running || snap.generation != generation
            };
            if settled || rx.changed().await.is_err() {
                break;
            }
        }
        self.flush(sequencer, generation);

        if sequencer.generation() == generation {
            println!("{}", format_outcome(outcome));
        }
    }
}

fn format_event(event: &FlowEvent, generation: u64) -> Option<String> {
    match event {
        FlowEvent::StepChanged {
            generation: run,
            ordinal,
            title,
            status,
        } if *run == generation => match status {
            // The terminal state of each step is enough on a scrolling terminal
            StepStatus::Pending | StepStatus::Active => None,
            _ => Some(format_step_line(*ordinal, title, *status)),
        },
        FlowEvent::TokensUpdated {
            has_delegation,
            has_access,
        } => Some(format_tokens_updated(*has_delegation, *has_access)),
        _ => None,
    }
}

/// Colored marker for a step status
pub fn status_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "\x1b[2m○\x1b[0m",
        StepStatus::Active => "\x1b[33m◐\x1b[0m",
        StepStatus::Complete => "\x1b[32m✓\x1b[0m",
        StepStatus::Error => "\x1b[31m✗\x1b[0m",
    }
}

/// Format one step: `  ✓ 2. ID-JAG Exchange`
pub fn format_step_line(ordinal: u32, title: &str, status: StepStatus) -> String {
    format!("  {} {}. {}", status_marker(status), ordinal, title)
}

fn format_tokens_updated(has_delegation: bool, has_access: bool) -> String {
    if has_delegation && has_access {
        "  \x1b[2m🔑 delegation and access tokens updated\x1b[0m".to_string()
    } else {
        "  \x1b[2m🔑 no token exchange recorded\x1b[0m".to_string()
    }
}

/// Summary line printed after a run settles
pub fn format_outcome(outcome: FlowOutcome) -> String {
    match outcome {
        FlowOutcome::Success => "  \x1b[32mAuthorized\x1b[0m".to_string(),
        FlowOutcome::Failure { stage } => {
            format!("  \x1b[31mHalted at {}\x1b[0m", stage.to_string().replace('_', " "))
        }
    }
}
