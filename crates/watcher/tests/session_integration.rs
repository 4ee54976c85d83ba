//! End-to-end tests: real notify watcher -> coalescer -> rule engine

use crossbeam_channel::Receiver;
use rules::{ActionDefinition, RuleDefinition, RuleEngine};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tidy_core::{ActionResult, ActionStatus, ActionType};
use watcher::{EventKind, RuleDispatcher, SettleEvent, SettleHandler, WatchConfig, WatchSession};

fn move_inbox_rule(destination: &Path) -> RuleEngine {
    RuleEngine::from_definitions(&[RuleDefinition {
        name: "File inbox".to_string(),
        conditions: [("PathContains".to_string(), "/inbox".to_string())]
            .into_iter()
            .collect(),
        action: ActionDefinition {
            action_type: "Move".to_string(),
            destination_path: Some(destination.to_path_buf()),
            overwrite: None,
        },
    }])
    .unwrap()
}

fn start(inbox: &Path, engine: RuleEngine) -> (WatchSession, Receiver<ActionResult>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let dispatcher = RuleDispatcher::new(engine).with_results(tx);
    let config = WatchConfig {
        quiet_period_ms: 200,
        ..WatchConfig::default()
    };

    let session =
        WatchSession::start(&[inbox.to_path_buf()], &config, Arc::new(dispatcher)).unwrap();
    (session, rx)
}

async fn recv(rx: &Receiver<ActionResult>, timeout: Duration) -> Option<ActionResult> {
    let rx = rx.clone();
    tokio::task::spawn_blocking(move || rx.recv_timeout(timeout).ok())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_file_is_moved_once() {
    let temp_dir = TempDir::new().unwrap();
    let inbox = temp_dir.path().join("inbox");
    let documents = temp_dir.path().join("documents");
    fs::create_dir_all(&inbox).unwrap();
    let (session, rx) = start(&inbox, move_inbox_rule(&documents));

    // Several writes for one logical change
    let file = inbox.join("notes.txt");
    fs::write(&file, "first").unwrap();
    fs::write(&file, "second").unwrap();
    fs::write(&file, "final").unwrap();

    let result = recv(&rx, Duration::from_secs(5)).await.expect("action result");
    assert_eq!(result.action_type, ActionType::Move);
    assert_eq!(result.status, ActionStatus::Success);
    assert_eq!(
        fs::read_to_string(documents.join("notes.txt")).unwrap(),
        "final"
    );
    assert!(!file.exists());

    // The burst produced exactly one action
    assert!(recv(&rx, Duration::from_millis(800)).await.is_none());

    session.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_partial_download_waits_for_final_name() {
    let temp_dir = TempDir::new().unwrap();
    let inbox = temp_dir.path().join("inbox");
    let documents = temp_dir.path().join("documents");
    fs::create_dir_all(&inbox).unwrap();
    let (session, rx) = start(&inbox, move_inbox_rule(&documents));

    let partial = inbox.join("report.pdf.part");
    fs::write(&partial, "%PDF-1.4").unwrap();
    assert!(recv(&rx, Duration::from_millis(600)).await.is_none());
    assert!(partial.exists());

    let complete = inbox.join("report.pdf");
    fs::rename(&partial, &complete).unwrap();

    let result = recv(&rx, Duration::from_secs(5)).await.expect("action result");
    assert_eq!(result.status, ActionStatus::Success);
    assert!(documents.join("report.pdf").is_file());
    assert!(recv(&rx, Duration::from_millis(600)).await.is_none());

    session.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_actions_after_stop() {
    let temp_dir = TempDir::new().unwrap();
    let inbox = temp_dir.path().join("inbox");
    let documents = temp_dir.path().join("documents");
    fs::create_dir_all(&inbox).unwrap();
    let (session, rx) = start(&inbox, move_inbox_rule(&documents));

    fs::write(inbox.join("late.txt"), "late").unwrap();
    session.stop();

    assert!(recv(&rx, Duration::from_secs(1)).await.is_none());
    assert!(inbox.join("late.txt").exists());
    assert!(!documents.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rename_settles_one_deletion() {
    let temp_dir = TempDir::new().unwrap();
    let inbox = temp_dir.path().join("inbox");
    fs::create_dir_all(&inbox).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded::<SettleEvent>();
    let handler: Arc<dyn SettleHandler> = Arc::new(move |event: SettleEvent| {
        let _ = tx.send(event);
    });
    let config = WatchConfig {
        quiet_period_ms: 200,
        ..WatchConfig::default()
    };
    let session = WatchSession::start(&[inbox.clone()], &config, handler).unwrap();
    let inbox = session.roots()[0].clone();

    let original = inbox.join("a.txt");
    fs::write(&original, "payload").unwrap();
    let settled = tokio::task::spawn_blocking({
        let rx = rx.clone();
        move || rx.recv_timeout(Duration::from_secs(5)).ok()
    })
    .await
    .unwrap()
    .expect("settle event for the new file");
    assert_eq!(settled.path, original);

    let renamed = inbox.join("b.txt");
    fs::rename(&original, &renamed).unwrap();

    let events: Vec<SettleEvent> = tokio::task::spawn_blocking(move || {
        let mut events = Vec::new();
        while let Ok(event) = rx.recv_timeout(Duration::from_millis(1000)) {
            events.push(event);
        }
        events
    })
    .await
    .unwrap();

    let deletions = events
        .iter()
        .filter(|e| e.kind == EventKind::Deleted && e.path == original)
        .count();
    let creations = events
        .iter()
        .filter(|e| e.kind != EventKind::Deleted && e.path == renamed)
        .count();
    assert_eq!(deletions, 1, "settle events: {:?}", events);
    assert_eq!(creations, 1, "settle events: {:?}", events);

    session.stop();
}
