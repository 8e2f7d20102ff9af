mod common;

use common::{statuses, PACING};
use flowgate_core::{
    FlowOutcome, FlowSequencer, FlowStage, StepGroup, StepSet, StepStatus, StepTemplate,
};
use std::time::Duration;

use StepStatus::{Active, Complete, Error, Pending};

fn two_step_set() -> StepSet {
    StepSet::new(vec![
        StepTemplate::new("Sign in", "", StepGroup::Primary, FlowStage::Identity),
        StepTemplate::new("Call {tool}", "Calling {tool}", StepGroup::Secondary, FlowStage::ToolCall),
    ])
}

/// Record every distinct snapshot the sequencer publishes.
fn record(seq: &FlowSequencer) -> tokio::task::JoinHandle<Vec<Vec<StepStatus>>> {
    let mut rx = seq.subscribe();
    tokio::spawn(async move {
        let mut seen = vec![statuses(&rx.borrow_and_update().steps)];
        while rx.changed().await.is_ok() {
            let snap = rx.borrow_and_update().clone();
            seen.push(statuses(&snap.steps));
            if !snap.running && snap.generation > 0 {
                break;
            }
        }
        seen
    })
}

fn rank(status: StepStatus) -> u8 {
    match status {
        Pending => 0,
        Active => 1,
        Complete | Error => 2,
    }
}

#[tokio::test(start_paused = true)]
async fn test_success_advances_monotonically_to_complete() {
    let seq = FlowSequencer::new(StepSet::reference(), PACING);
    let recorder = record(&seq);

    seq.start(FlowOutcome::Success, "get_customer");
    let seen = recorder.await.unwrap();

    for state in &seen {
        assert!(state.iter().filter(|s| **s == Active).count() <= 1);
        // Strict ordinal order: nothing after an unfinished step has moved
        let first_unfinished = state.iter().position(|s| *s != Complete).unwrap_or(state.len());
        assert!(state[first_unfinished..].iter().skip(1).all(|s| *s == Pending));
    }
    for pair in seen.windows(2) {
        for (before, after) in pair[0].iter().zip(&pair[1]) {
            assert!(rank(*after) >= rank(*before), "status moved backwards: {:?}", pair);
        }
    }
    assert_eq!(seen.last().unwrap(), &vec![Complete; 4]);
}

#[tokio::test(start_paused = true)]
async fn test_failure_never_touches_later_steps() {
    let seq = FlowSequencer::new(StepSet::reference(), PACING);
    let recorder = record(&seq);

    seq.start(FlowOutcome::failure(FlowStage::Delegation), "get_customer");
    let seen = recorder.await.unwrap();

    for state in &seen {
        assert_eq!(state[2], Pending);
        assert_eq!(state[3], Pending);
    }
    assert_eq!(seen.last().unwrap(), &vec![Complete, Error, Pending, Pending]);
}

#[tokio::test(start_paused = true)]
async fn test_reset_voids_pending_transitions() {
    let seq = FlowSequencer::new(StepSet::reference(), PACING);
    let first = seq.start(FlowOutcome::Success, "get_customer");
    tokio::time::sleep(PACING / 2).await;

    seq.reset();
    let after_reset = seq.generation();
    assert!(after_reset > first);

    let mut rx = seq.subscribe();
    rx.borrow_and_update();
    let changed = tokio::time::timeout(PACING * 20, rx.changed()).await;
    assert!(changed.is_err(), "voided run still published a change");
    assert!(seq.snapshot().all_pending());
}

#[tokio::test(start_paused = true)]
async fn test_reset_then_start_only_shows_new_run() {
    let seq = FlowSequencer::new(StepSet::reference(), PACING);
    seq.start(FlowOutcome::Success, "get_customer");
    tokio::time::sleep(PACING * 2 + PACING / 2).await;

    seq.reset();
    let second = seq.start(FlowOutcome::failure(FlowStage::Identity), "get_customer");
    let snap = seq.wait_settled().await;

    assert_eq!(snap.generation, second);
    assert_eq!(statuses(&snap.steps), vec![Error, Pending, Pending, Pending]);
}

#[tokio::test(start_paused = true)]
async fn test_pacing_controls_duration() {
    let seq = FlowSequencer::new(StepSet::reference(), Duration::from_millis(700));
    let started = tokio::time::Instant::now();
    seq.start(FlowOutcome::Success, "get_customer");
    seq.wait_settled().await;
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(2800));
    assert!(elapsed < Duration::from_millis(2900));
}

#[tokio::test(start_paused = true)]
async fn test_custom_step_set_and_stage_fallback() {
    let seq = FlowSequencer::new(two_step_set(), PACING);
    seq.start(FlowOutcome::failure(FlowStage::AccessGrant), "initiate_payment");
    let snap = seq.wait_settled().await;

    // No AccessGrant step: the failure surfaces at the next stage present
    assert_eq!(statuses(&snap.steps), vec![Complete, Error]);
    assert_eq!(snap.steps[1].title, "Call initiate_payment");
    assert_eq!(snap.steps[1].description, "Calling initiate_payment");
}

#[tokio::test(start_paused = true)]
async fn test_clones_share_state() {
    let seq = FlowSequencer::new(StepSet::reference(), PACING);
    let other = seq.clone();
    other.start(FlowOutcome::Success, "get_customer");
    assert!(seq.is_running());
    seq.reset();
    assert!(!other.is_running());
}
