//! Integration tests for tours backed by the on-disk progress store
//!
//! Each test owns a temp state directory. A "restart" drops every in-memory
//! object and reopens the store from disk, which is all that survives a real
//! process restart.

use std::cell::RefCell;
use std::rc::Rc;

use tempfile::TempDir;
use tourguide::config::StepsConfig;
use tourguide::progress::{FileProgressStore, ProgressStatus, ProgressStore};
use tourguide::terminal::{self, TerminalHost, TerminalStep};
use tourguide::tour::TourDefinition;
use tourguide::{Host, Phase, Sequence};

// ─── Helpers ─────────────────────────────────────────────────────────────────

const ONBOARDING: &str = r#"
id = "onboarding"

[[steps]]
target = "toolbar"
title = "A"
content = "Step A"

[[steps]]
target = "sidebar"
title = "B"
content = "Step B"

[[steps]]
title = "C"
content = "Step C"
"#;

type TerminalSequence = Sequence<TerminalHost<Vec<u8>>, TerminalStep>;

/// Callback trace: ("shown" | "dismissed" | "finished", title, position)
type Trace = Rc<RefCell<Vec<(String, String, u32)>>>;

fn host() -> TerminalHost<Vec<u8>> {
    let mut host = TerminalHost::new(Vec::new());
    host.add_target("toolbar");
    host.add_target("sidebar");
    host
}

/// Simulates a fresh process: reopen the store and rebuild the tour
fn launch(state: &TempDir, trace: &Trace) -> TerminalSequence {
    let store = FileProgressStore::open(state.path()).unwrap();
    let tour = TourDefinition::parse(ONBOARDING).unwrap();
    let mut sequence = tour.into_sequence(host(), &StepsConfig::default(), store);

    let shown = Rc::clone(trace);
    sequence.set_on_item_shown(move |step, position| {
        shown
            .borrow_mut()
            .push(("shown".into(), step.title().into(), position));
    });
    let dismissed = Rc::clone(trace);
    sequence.set_on_item_dismissed(move |step, position| {
        dismissed
            .borrow_mut()
            .push(("dismissed".into(), step.title().into(), position));
    });
    let finished = Rc::clone(trace);
    sequence.set_on_sequence_finished(move || {
        finished
            .borrow_mut()
            .push(("finished".into(), String::new(), 0));
    });
    sequence
}

fn persisted(state: &TempDir) -> ProgressStatus {
    FileProgressStore::open(state.path())
        .unwrap()
        .read("onboarding")
        .unwrap()
}

fn entry(kind: &str, title: &str, position: u32) -> (String, String, u32) {
    (kind.to_string(), title.to_string(), position)
}

/// Everything the tour wrote to its terminal
fn output(mut sequence: TerminalSequence) -> String {
    String::from_utf8(std::mem::take(sequence.host_mut().writer())).unwrap()
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn test_full_run_with_skip() {
    let state = TempDir::new().unwrap();
    let trace = Trace::default();
    let mut sequence = launch(&state, &trace);

    sequence.start().unwrap();
    sequence.on_detach(true).unwrap();
    assert_eq!(persisted(&state), ProgressStatus::InProgress(1));

    sequence.pending_step_mut().unwrap().skip();
    sequence.on_detach(true).unwrap();

    assert_eq!(
        *trace.borrow(),
        vec![
            entry("shown", "A", 0),
            entry("dismissed", "A", 0),
            entry("shown", "B", 1),
            entry("dismissed", "B", 1),
            entry("finished", "", 0),
        ]
    );
    assert_eq!(sequence.phase(), Phase::Finished);
    assert_eq!(persisted(&state), ProgressStatus::Finished);

    let out = output(sequence);
    assert!(out.contains("Step A"));
    assert!(out.contains("Step B"));
    assert!(!out.contains("Step C"));
}

#[test]
fn test_restart_resumes_after_checkpoint() {
    let state = TempDir::new().unwrap();

    let first_trace = Trace::default();
    let mut first = launch(&state, &first_trace);
    first.start().unwrap();
    first.on_detach(true).unwrap();
    drop(first);

    let trace = Trace::default();
    let mut second = launch(&state, &trace);
    second.start().unwrap();

    assert_eq!(*trace.borrow(), vec![entry("shown", "B", 1)]);
    assert_eq!(second.position(), 1);

    let out = output(second);
    assert!(!out.contains("Step A"));
    assert!(out.contains("Step B"));
}

#[test]
fn test_quit_mid_tour_is_resumable() {
    let state = TempDir::new().unwrap();

    let trace = Trace::default();
    let mut first = launch(&state, &trace);
    first.start().unwrap();
    first.host_mut().finish();
    first.on_detach(false).unwrap();

    assert_eq!(first.phase(), Phase::Abandoned);
    assert_eq!(*trace.borrow(), vec![entry("shown", "A", 0)]);
    assert_eq!(persisted(&state), ProgressStatus::InProgress(0));
    drop(first);

    let resumed_trace = Trace::default();
    let mut resumed = launch(&state, &resumed_trace);
    resumed.start().unwrap();
    assert_eq!(*resumed_trace.borrow(), vec![entry("shown", "A", 0)]);
}

#[test]
fn test_completed_tour_never_replays() {
    let state = TempDir::new().unwrap();

    let trace = Trace::default();
    let mut first = launch(&state, &trace);
    first.start().unwrap();
    while first.is_presenting() {
        first.on_detach(true).unwrap();
    }
    assert!(first.has_fired().unwrap());
    drop(first);

    let again_trace = Trace::default();
    let mut again = launch(&state, &again_trace);
    assert!(again.has_fired().unwrap());
    again.start().unwrap();

    assert!(again_trace.borrow().is_empty());
    assert!(output(again).is_empty());
}

#[test]
fn test_missing_target_does_not_count_toward_progress() {
    let state = TempDir::new().unwrap();
    let store = FileProgressStore::open(state.path()).unwrap();
    let tour = TourDefinition::parse(ONBOARDING).unwrap();

    // Only the toolbar is on screen, so B is passed over
    let mut host = TerminalHost::new(Vec::new());
    host.add_target("toolbar");
    let mut sequence = tour.into_sequence(host, &StepsConfig::default(), store);

    sequence.start().unwrap();
    sequence.on_detach(true).unwrap();
    assert_eq!(
        sequence.pending_step().map(TerminalStep::title),
        Some("C")
    );
    assert_eq!(persisted(&state), ProgressStatus::InProgress(1));

    sequence.on_detach(true).unwrap();
    assert_eq!(persisted(&state), ProgressStatus::Finished);
}

#[test]
fn test_reset_replays_tour() {
    let state = TempDir::new().unwrap();

    let trace = Trace::default();
    let mut first = launch(&state, &trace);
    first.start().unwrap();
    while first.is_presenting() {
        first.on_detach(true).unwrap();
    }
    drop(first);
    assert_eq!(persisted(&state), ProgressStatus::Finished);

    FileProgressStore::open(state.path())
        .unwrap()
        .reset("onboarding")
        .unwrap();

    let replay_trace = Trace::default();
    let mut replay = launch(&state, &replay_trace);
    replay.start().unwrap();
    assert_eq!(*replay_trace.borrow(), vec![entry("shown", "A", 0)]);
}

#[test]
fn test_tour_without_id_leaves_no_record() {
    let state = TempDir::new().unwrap();
    let store = FileProgressStore::open(state.path()).unwrap();
    let tour = TourDefinition::parse("[[steps]]\ncontent = \"Hello\"\n").unwrap();
    let mut sequence = tour.into_sequence(host(), &StepsConfig::default(), store);

    sequence.start().unwrap();
    sequence.on_detach(true).unwrap();

    assert_eq!(sequence.phase(), Phase::Finished);
    let reopened = FileProgressStore::open(state.path()).unwrap();
    assert!(reopened.records().unwrap().is_empty());
}

#[test]
fn test_bundled_demo_tour_parses() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/onboarding.toml");
    let tour = TourDefinition::load(path).unwrap();

    assert_eq!(tour.id.as_deref(), Some("onboarding"));
    assert_eq!(tour.steps.len(), 5);
    assert_eq!(tour.steps[3].only_if_env.as_deref(), Some("TOURGUIDE_BETA"));
}

// ─── Scripted input ──────────────────────────────────────────────────────────

#[test]
fn test_play_enter_then_skip_finishes_tour() {
    let state = TempDir::new().unwrap();
    let trace = Trace::default();
    let mut sequence = launch(&state, &trace);

    sequence.start().unwrap();
    terminal::play(&mut sequence, "\ns\n".as_bytes()).unwrap();

    assert_eq!(sequence.phase(), Phase::Finished);
    assert_eq!(persisted(&state), ProgressStatus::Finished);
    assert_eq!(
        *trace.borrow(),
        vec![
            entry("shown", "A", 0),
            entry("dismissed", "A", 0),
            entry("shown", "B", 1),
            entry("dismissed", "B", 1),
            entry("finished", "", 0),
        ]
    );
}

#[test]
fn test_play_quit_leaves_tour_resumable() {
    let state = TempDir::new().unwrap();
    let trace = Trace::default();
    let mut sequence = launch(&state, &trace);

    sequence.start().unwrap();
    terminal::play(&mut sequence, "\nq\nignored\n".as_bytes()).unwrap();

    assert_eq!(sequence.phase(), Phase::Abandoned);
    assert!(sequence.host().is_finishing());
    assert_eq!(persisted(&state), ProgressStatus::InProgress(1));
    drop(sequence);

    let resumed_trace = Trace::default();
    let mut resumed = launch(&state, &resumed_trace);
    resumed.start().unwrap();
    assert_eq!(*resumed_trace.borrow(), vec![entry("shown", "B", 1)]);
}

#[test]
fn test_play_end_of_input_is_a_quit() {
    let state = TempDir::new().unwrap();
    let trace = Trace::default();
    let mut sequence = launch(&state, &trace);

    sequence.start().unwrap();
    terminal::play(&mut sequence, "".as_bytes()).unwrap();

    assert_eq!(sequence.phase(), Phase::Abandoned);
    assert_eq!(persisted(&state), ProgressStatus::InProgress(0));
    assert_eq!(*trace.borrow(), vec![entry("shown", "A", 0)]);
}

#[test]
fn test_two_tours_share_a_state_dir() {
    let state = TempDir::new().unwrap();

    // Both tours are built before either records anything
    let store = FileProgressStore::open(state.path()).unwrap();
    let tour = TourDefinition::parse("id = \"settings\"\n[[steps]]\ncontent = \"Hi\"\n").unwrap();
    let mut settings = tour.into_sequence(host(), &StepsConfig::default(), store);
    let mut onboarding = launch(&state, &Trace::default());

    onboarding.start().unwrap();
    onboarding.on_detach(true).unwrap();
    onboarding.on_detach(true).unwrap();

    settings.start().unwrap();
    settings.on_detach(true).unwrap();
    assert!(settings.has_fired().unwrap());

    assert_eq!(persisted(&state), ProgressStatus::InProgress(2));
}
