//! Build and upload orchestration across configured boards
//!
//! Sequences multi-board operations, hands serial ports between monitoring
//! and flashing, and carries one cancellation scope per run. Only one run
//! is expected to be in flight at a time; the caller disables re-entry
//! while busy.

use std::sync::Mutex;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::mpsc;

use crate::models::{BoardAssociation, OperationResult, ToolEvent};
use crate::serial::SerialSessionManager;
use crate::services::cancel::CancelToken;
use crate::services::runner::ProcessRunner;

/// Lifecycle of one orchestrated run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

struct RunControl {
    state: RunState,
    token: Option<CancelToken>,
}

/// Sequences build/upload invocations and coordinates port hand-off with
/// the session manager.
pub struct BuildOrchestrator {
    sessions: SerialSessionManager,
    runner: ProcessRunner,
    settle_delay: Duration,
    control: Mutex<RunControl>,
}

impl BuildOrchestrator {
    pub fn new(
        sessions: SerialSessionManager,
        runner: ProcessRunner,
        settle_delay: Duration,
    ) -> Self {
        Self {
            sessions,
            runner,
            settle_delay,
            control: Mutex::new(RunControl {
                state: RunState::Idle,
                token: None,
            }),
        }
    }

    pub fn state(&self) -> RunState {
        self.control
            .lock()
            .map(|control| control.state)
            .unwrap_or(RunState::Idle)
    }

    /// Request cooperative cancellation of the running operation. No effect
    /// when idle.
    pub fn cancel(&self) {
        if let Ok(control) = self.control.lock() {
            if control.state == RunState::Running {
                if let Some(token) = &control.token {
                    info!("Cancelling current orchestrated operation");
                    token.cancel();
                }
            }
        }
    }

    /// Build one board's project.
    pub async fn build_one(
        &self,
        board: &BoardAssociation,
        tx: mpsc::UnboundedSender<ToolEvent>,
    ) -> OperationResult {
        let token = self.begin_run();
        let result = self.build_board(board, &tx, &token).await;
        self.finish_run(&token);
        result
    }

    /// Upload one board's project, releasing a monitored port first and
    /// taking it back after a successful upload.
    pub async fn upload_one(
        &self,
        board: &BoardAssociation,
        tx: mpsc::UnboundedSender<ToolEvent>,
    ) -> OperationResult {
        let token = self.begin_run();
        let result = self.upload_board(board, &tx, &token).await;
        self.finish_run(&token);
        result
    }

    /// Build every board with a configured project, in list order.
    pub async fn build_all(
        &self,
        boards: &[BoardAssociation],
        tx: mpsc::UnboundedSender<ToolEvent>,
    ) -> Vec<OperationResult> {
        let token = self.begin_run();
        let mut results = Vec::new();

        for board in boards.iter().filter(|b| b.project.is_some()) {
            if token.is_cancelled() {
                let _ = tx.send(ToolEvent::Output("🛑 Build sequence cancelled".to_string()));
                break;
            }
            results.push(self.build_board(board, &tx, &token).await);
        }

        self.finish_run(&token);
        results
    }

    /// Upload every board with a configured project and port, in list
    /// order. Every open session is closed up front so no port is
    /// contended during the batch.
    pub async fn upload_all(
        &self,
        boards: &[BoardAssociation],
        tx: mpsc::UnboundedSender<ToolEvent>,
    ) -> Vec<OperationResult> {
        let token = self.begin_run();

        self.sessions.disconnect_all().await;

        let mut results = Vec::new();
        for board in boards
            .iter()
            .filter(|b| b.project.is_some() && b.port.is_some())
        {
            if token.is_cancelled() {
                let _ = tx.send(ToolEvent::Output(
                    "🛑 Upload sequence cancelled".to_string(),
                ));
                break;
            }
            results.push(self.upload_board(board, &tx, &token).await);
        }

        self.finish_run(&token);
        results
    }

    async fn build_board(
        &self,
        board: &BoardAssociation,
        tx: &mpsc::UnboundedSender<ToolEvent>,
        token: &CancelToken,
    ) -> OperationResult {
        let Some(project) = &board.project else {
            return OperationResult::failed(format!("Board {} has no project configured", board.id));
        };

        let _ = tx.send(ToolEvent::Output(format!(
            "🔨 Building {} ({})",
            board.id, board.board_type
        )));
        self.runner
            .build(
                project,
                board.environment.as_deref(),
                tx.clone(),
                token.clone(),
            )
            .await
    }

    async fn upload_board(
        &self,
        board: &BoardAssociation,
        tx: &mpsc::UnboundedSender<ToolEvent>,
        token: &CancelToken,
    ) -> OperationResult {
        let Some(project) = &board.project else {
            return OperationResult::failed(format!("Board {} has no project configured", board.id));
        };

        // Flashing and monitoring cannot share the port. Release it first
        // and remember whether this upload has to take it back.
        let mut reacquire = None;
        if let Some(port) = &board.port {
            if self.sessions.is_connected(port).await {
                info!("Releasing {} for upload", port);
                self.sessions.disconnect(port).await;
                reacquire = Some(port.clone());
            }
        }

        let _ = tx.send(ToolEvent::Output(format!(
            "🔥 Uploading {} ({})",
            board.id, board.board_type
        )));
        let result = self
            .runner
            .upload(
                project,
                board.port.as_deref(),
                board.environment.as_deref(),
                tx.clone(),
                token.clone(),
            )
            .await;

        // Only a successful upload earns the port back; failure leaves it
        // free for inspection with other tools.
        if result.success {
            if let Some(port) = reacquire {
                tokio::select! {
                    _ = tokio::time::sleep(self.settle_delay) => {
                        if self.sessions.connect(&port, board.baud_rate).await {
                            let _ = tx.send(ToolEvent::Output(format!(
                                "📺 Monitoring {} again at {} baud",
                                port, board.baud_rate
                            )));
                        } else {
                            warn!("Could not reopen {} after upload", port);
                            let _ = tx.send(ToolEvent::Output(format!(
                                "⚠️  Could not reopen {} after upload",
                                port
                            )));
                        }
                    }
                    _ = token.cancelled() => {}
                }
            }
        }

        result
    }

    fn begin_run(&self) -> CancelToken {
        let token = CancelToken::new();
        if let Ok(mut control) = self.control.lock() {
            control.state = RunState::Running;
            control.token = Some(token.clone());
        }
        token
    }

    fn finish_run(&self, token: &CancelToken) {
        if let Ok(mut control) = self.control.lock() {
            control.state = if token.is_cancelled() {
                RunState::Cancelled
            } else {
                RunState::Completed
            };
            control.token = None;
        }
    }
}
