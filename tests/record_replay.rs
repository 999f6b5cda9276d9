//! Record-replay round-trip integration tests.
//!
//! 1. Record a run through the recording adapters.
//! 2. Replay the cassette through `ServiceContext::replaying()`.
//! 3. Assert identical outcomes between recording and replaying.
//! 4. Replay a second time and assert determinism.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::json;

use tracklink::cassette::recorder::CassetteRecorder;
use tracklink::config::Config;
use tracklink::context::ServiceContext;
use tracklink::correlate::{CorrelatedAction, PlannedAction, TrackerState};
use tracklink::dispatch::{dispatch, DispatchReport};
use tracklink::keys::WorkItemId;

fn id(value: &str) -> WorkItemId {
    value.parse().unwrap()
}

fn plan() -> Vec<PlannedAction> {
    vec![
        PlannedAction {
            work_item: id("PROJ-7"),
            action: CorrelatedAction::AppendComment { text: "Deployed to staging".into() },
        },
        PlannedAction {
            work_item: id("PROJ-7"),
            action: CorrelatedAction::TransitionStatus { target: TrackerState::Testing },
        },
    ]
}

async fn replay(path: &Path) -> DispatchReport {
    let ctx = ServiceContext::replaying(path).unwrap();
    dispatch(ctx.tracker.as_ref(), plan()).await
}

#[tokio::test]
async fn recorded_run_replays_identically() {
    let root = std::env::temp_dir().join("tracklink_record_replay_test");
    let _ = std::fs::remove_dir_all(&root);

    // --- Phase 1: record against an unconfigured tracker ---
    let (ctx, session) = ServiceContext::recording(&Config::default(), &root, "run-1").unwrap();
    let recorded = dispatch(ctx.tracker.as_ref(), plan()).await;
    let recorded_at = ctx.clock.now();
    drop(ctx);
    let cassette = session.finish().unwrap();

    assert_eq!(cassette, root.join("run-1.cassette.yaml"));
    assert_eq!(recorded.failed(), 2);

    // --- Phase 2: replay and compare ---
    let first = replay(&cassette).await;
    assert_eq!(first.to_string(), recorded.to_string());

    // --- Phase 3: determinism ---
    let second = replay(&cassette).await;
    assert_eq!(first, second);

    let clock = ServiceContext::replaying(&cassette).unwrap();
    assert_eq!(clock.clock.now(), recorded_at);

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn hand_built_cassette_drives_dispatch() {
    let dir = std::env::temp_dir().join("tracklink_hand_cassette_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("run.cassette.yaml");

    let mut recorder = CassetteRecorder::new(&path, "hand-built", "run");
    recorder.record(
        "tracker",
        "append_comment",
        json!({"id": "PROJ-7", "text": "Deployed to staging"}),
        json!({"Ok": null}),
    );
    recorder.record(
        "tracker",
        "transition_status",
        json!({"id": "PROJ-7", "target": "testing"}),
        json!({"Ok": null}),
    );
    recorder.finish().unwrap();

    let report = replay(&path).await;
    assert!(report.is_success());
    assert_eq!(report.succeeded(), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

fn tracklink(args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tracklink"));
    command
        .args(args)
        .current_dir(std::env::temp_dir())
        .env_remove("TRACKER_BASE_URL")
        .env_remove("TRACKER_EMAIL")
        .env_remove("TRACKER_API_TOKEN")
        .env_remove("TRACKLINK_RECORD")
        .env_remove("TRACKLINK_REPLAY");
    command
}

/// Records one binary run into `root` and returns the output and the
/// single cassette file it wrote.
fn record_run(root: &Path, args: &[&str]) -> (Output, PathBuf) {
    let _ = std::fs::remove_dir_all(root);
    std::fs::create_dir_all(root).unwrap();

    let recorded = tracklink(args).env("TRACKLINK_RECORD", root).output().unwrap();
    assert!(String::from_utf8_lossy(&recorded.stderr).contains("Recording saved to"));

    let files: Vec<PathBuf> =
        std::fs::read_dir(root).unwrap().map(|entry| entry.unwrap().path()).collect();
    assert_eq!(files.len(), 1, "expected exactly one cassette, found {files:?}");
    (recorded, files.into_iter().next().unwrap())
}

#[test]
fn binary_records_then_replays_a_commit() {
    let root = std::env::temp_dir().join("tracklink_binary_record_test");
    let args = [
        "commit",
        "--hash",
        "feedface",
        "--message",
        "PROJ-5 cache tokens",
        "--author",
        "dev",
        "--branch",
        "main",
    ];

    let (recorded, cassette) = record_run(&root, &args);
    assert!(!recorded.status.success());
    let content = std::fs::read_to_string(&cassette).unwrap();
    assert!(content.contains("PROJ-5"));

    let replayed = tracklink(&args).env("TRACKLINK_REPLAY", &cassette).output().unwrap();
    assert!(!replayed.status.success());
    let recorded_out = String::from_utf8_lossy(&recorded.stdout);
    let replayed_out = String::from_utf8_lossy(&replayed.stdout);
    assert!(recorded_out.contains("1 action(s): 0 succeeded, 1 failed"));
    assert_eq!(replayed_out, recorded_out);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn binary_replays_a_recorded_agent_start_with_its_clock_reading() {
    let root = std::env::temp_dir().join("tracklink_binary_agent_record_test");
    let args = ["agent-start", "--agent", "backend", "--issue", "PROJ-1"];

    let (recorded, cassette) = record_run(&root, &args);
    assert_eq!(recorded.status.code(), Some(1));
    let content = std::fs::read_to_string(&cassette).unwrap();
    assert!(content.contains("port: clock"));
    assert!(content.contains("port: tracker"));

    let replayed = tracklink(&args).env("TRACKLINK_REPLAY", &cassette).output().unwrap();
    assert_eq!(
        replayed.status.code(),
        Some(1),
        "stderr: {}",
        String::from_utf8_lossy(&replayed.stderr)
    );
    assert!(!String::from_utf8_lossy(&replayed.stderr).contains("cassette exhausted"));
    assert_eq!(replayed.stdout, recorded.stdout);

    let _ = std::fs::remove_dir_all(&root);
}
