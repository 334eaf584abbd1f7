//! Integration tests for the build/upload orchestrator

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use nodedeck::models::{BoardAssociation, ToolEvent};
use nodedeck::serial::SerialSessionManager;
use nodedeck::services::{BuildOrchestrator, ProcessRunner, RunState};

const SETTLE: Duration = Duration::from_millis(10);

fn board(id: &str, project: Option<PathBuf>, port: Option<&str>) -> BoardAssociation {
    let mut board = BoardAssociation::new(id, "esp32dev");
    board.project = project;
    board.port = port.map(|p| p.to_string());
    board
}

fn orchestrator_with_tool(tool: Option<PathBuf>) -> (Arc<BuildOrchestrator>, SerialSessionManager) {
    let sessions = SerialSessionManager::new();
    let runner = ProcessRunner::new(tool);
    let orchestrator = Arc::new(BuildOrchestrator::new(sessions.clone(), runner, SETTLE));
    (orchestrator, sessions)
}

#[tokio::test]
async fn build_one_without_a_project_fails_cleanly() {
    let (orchestrator, _) = orchestrator_with_tool(None);
    let (tx, _rx) = mpsc::unbounded_channel();

    let result = orchestrator
        .build_one(&board("node-a", None, None), tx)
        .await;

    assert!(!result.success);
    assert!(result.output[0].contains("no project configured"));
    assert_eq!(orchestrator.state(), RunState::Completed);
}

#[tokio::test]
async fn upload_failure_makes_no_reconnect_attempt() {
    let temp = TempDir::new().expect("create temp dir");
    // A tool path that does not exist: the upload fails before any spawn.
    let (orchestrator, sessions) =
        orchestrator_with_tool(Some(PathBuf::from("/nonexistent/nodedeck-test/pio")));
    let (tx, _rx) = mpsc::unbounded_channel();

    let target = board(
        "node-a",
        Some(temp.path().to_path_buf()),
        Some("/dev/nodedeck-test-missing"),
    );
    let result = orchestrator.upload_one(&target, tx).await;

    assert!(!result.success);
    // The port was never monitored and the upload failed, so nothing may
    // have tried to open it.
    assert!(!sessions.is_connected("/dev/nodedeck-test-missing").await);
    assert_eq!(orchestrator.state(), RunState::Completed);
}

#[tokio::test]
async fn build_all_skips_boards_without_a_project() {
    let temp = TempDir::new().expect("create temp dir");
    let (orchestrator, _) =
        orchestrator_with_tool(Some(PathBuf::from("/nonexistent/nodedeck-test/pio")));
    let (tx, _rx) = mpsc::unbounded_channel();

    let boards = vec![
        board("node-a", Some(temp.path().to_path_buf()), None),
        board("node-b", None, None),
    ];
    let results = orchestrator.build_all(&boards, tx).await;

    // Only the board with a project produces a result.
    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
}

#[tokio::test]
async fn cancel_while_idle_is_a_no_op() {
    let (orchestrator, _) = orchestrator_with_tool(None);
    assert_eq!(orchestrator.state(), RunState::Idle);
    orchestrator.cancel();
    assert_eq!(orchestrator.state(), RunState::Idle);
}

#[cfg(unix)]
#[tokio::test]
async fn upload_all_stops_after_the_board_in_flight_when_cancelled() {
    let temp = TempDir::new().expect("create temp dir");
    let tool = common::fake_tool(temp.path(), "echo uploading\nsleep 30");
    let (orchestrator, _) = orchestrator_with_tool(Some(tool));
    let (tx, _rx) = mpsc::unbounded_channel();

    let boards = vec![
        board(
            "node-a",
            Some(temp.path().to_path_buf()),
            Some("/dev/ttyUSB0"),
        ),
        board(
            "node-b",
            Some(temp.path().to_path_buf()),
            Some("/dev/ttyUSB1"),
        ),
    ];

    let canceller = orchestrator.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        canceller.cancel();
    });

    let results = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.upload_all(&boards, tx),
    )
    .await
    .expect("cancelled batch must return promptly");

    // The first board's upload was started, cancelled, and still yielded a
    // result; the second board never started.
    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert_eq!(orchestrator.state(), RunState::Cancelled);
}

#[cfg(unix)]
#[tokio::test]
async fn build_all_runs_boards_in_order_and_reports_per_board() {
    let temp = TempDir::new().expect("create temp dir");
    let tool = common::fake_tool(temp.path(), "echo building\nexit 0");
    let (orchestrator, _) = orchestrator_with_tool(Some(tool));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let boards = vec![
        board("node-a", Some(temp.path().to_path_buf()), None),
        board("node-b", Some(temp.path().to_path_buf()), None),
    ];
    let results = orchestrator.build_all(&boards, tx).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|result| result.success));
    assert_eq!(orchestrator.state(), RunState::Completed);

    // Status lines name the boards in configuration order.
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ToolEvent::Output(line) = event {
            if line.contains("Building") {
                seen.push(line);
            }
        }
    }
    assert_eq!(seen.len(), 2);
    assert!(seen[0].contains("node-a"));
    assert!(seen[1].contains("node-b"));
}
