//! External tool execution
//!
//! Runs the PlatformIO CLI (`pio`) as cancellable child processes, streaming
//! captured stdout/stderr lines to subscribers while buffering them for the
//! final result. Every failure mode (missing tool, spawn error, non-zero
//! exit, cancellation) becomes a failed `OperationResult`, never a raised
//! error.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use chrono::Local;
use log::{debug, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::{OperationResult, ToolEvent};
use crate::services::cancel::CancelToken;

/// Marker line appended to the captured output of a cancelled invocation
pub const CANCELLED_MARKER: &str = "*** cancelled ***";

/// Runs PlatformIO invocations as cancellable asynchronous tasks.
#[derive(Clone)]
pub struct ProcessRunner {
    tool_path: Option<PathBuf>,
}

impl ProcessRunner {
    /// A runner using `tool_path` when set, otherwise `pio` from PATH.
    pub fn new(tool_path: Option<PathBuf>) -> Self {
        Self { tool_path }
    }

    /// Build the project, optionally for a single environment.
    pub async fn build(
        &self,
        project: &Path,
        environment: Option<&str>,
        tx: mpsc::UnboundedSender<ToolEvent>,
        cancel: CancelToken,
    ) -> OperationResult {
        let mut args = project_args(project);
        if let Some(env) = environment {
            args.push("-e".into());
            args.push(env.into());
        }
        self.run_tool(args, tx, cancel).await
    }

    /// Build and upload the project.
    pub async fn upload(
        &self,
        project: &Path,
        port: Option<&str>,
        environment: Option<&str>,
        tx: mpsc::UnboundedSender<ToolEvent>,
        cancel: CancelToken,
    ) -> OperationResult {
        let mut args = project_args(project);
        args.push("--target".into());
        args.push("upload".into());
        if let Some(env) = environment {
            args.push("-e".into());
            args.push(env.into());
        }
        if let Some(port) = port {
            args.push("--upload-port".into());
            args.push(port.into());
        }
        self.run_tool(args, tx, cancel).await
    }

    /// Remove the project's build artifacts.
    pub async fn clean(
        &self,
        project: &Path,
        tx: mpsc::UnboundedSender<ToolEvent>,
        cancel: CancelToken,
    ) -> OperationResult {
        let mut args = project_args(project);
        args.push("--target".into());
        args.push("clean".into());
        self.run_tool(args, tx, cancel).await
    }

    /// Collect `[env:<name>]` section names from the project's
    /// `platformio.ini`, in file order. Absent or unreadable descriptors
    /// yield an empty list.
    pub fn list_environments(project: &Path) -> Vec<String> {
        let descriptor = project.join("platformio.ini");
        let content = match std::fs::read_to_string(&descriptor) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };

        let mut environments = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if let Some(name) = line.strip_prefix("[env:").and_then(|s| s.strip_suffix("]")) {
                if !name.is_empty() {
                    environments.push(name.to_string());
                }
            }
        }
        environments
    }

    /// Resolve the tool executable: the configured path when it exists,
    /// otherwise `pio` from PATH.
    fn resolve_tool(&self) -> Option<PathBuf> {
        if let Some(path) = &self.tool_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!("Configured tool path {} does not exist", path.display());
            return None;
        }
        which::which("pio").ok()
    }

    async fn run_tool(
        &self,
        args: Vec<OsString>,
        tx: mpsc::UnboundedSender<ToolEvent>,
        cancel: CancelToken,
    ) -> OperationResult {
        let Some(tool) = self.resolve_tool() else {
            return fail_without_spawn(
                "PlatformIO CLI not found: set its path in the configuration or install pio on PATH",
                &tx,
            );
        };

        debug!("Running {} {:?}", tool.display(), args);

        let mut cmd = Command::new(&tool);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return fail_without_spawn(
                    format!("Failed to start {}: {}", tool.display(), e),
                    &tx,
                );
            }
        };

        let output = Arc::new(Mutex::new(Vec::new()));
        let stdout_task = capture_stream(child.stdout.take(), output.clone(), tx.clone());
        let stderr_task = capture_stream(child.stderr.take(), output.clone(), tx.clone());

        // The wait future is dropped before the kill below touches the
        // child again.
        let status = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel.cancelled() => None,
        };

        let (success, cancelled) = match status {
            Some(Ok(status)) => (status.success(), false),
            Some(Err(e)) => {
                warn!("Failed to wait for {}: {}", tool.display(), e);
                (false, false)
            }
            None => {
                debug!("Cancellation requested, killing {}", tool.display());
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {}: {}", tool.display(), e);
                }
                (false, true)
            }
        };

        // Let both capture tasks drain whatever the process wrote before it
        // exited.
        let _ = stdout_task.await;
        let _ = stderr_task.await;

        let mut lines = output.lock().map(|guard| guard.clone()).unwrap_or_default();
        if cancelled {
            lines.push(CANCELLED_MARKER.to_string());
            let _ = tx.send(ToolEvent::Output(CANCELLED_MARKER.to_string()));
        }

        let _ = tx.send(ToolEvent::Finished(success));
        OperationResult {
            success,
            output: lines,
            finished_at: Local::now(),
        }
    }
}

fn project_args(project: &Path) -> Vec<OsString> {
    // The project directory goes through as one argument, so embedded
    // whitespace survives.
    vec![
        "run".into(),
        "-d".into(),
        project.as_os_str().to_os_string(),
    ]
}

fn fail_without_spawn(
    message: impl Into<String>,
    tx: &mpsc::UnboundedSender<ToolEvent>,
) -> OperationResult {
    let result = OperationResult::failed(message);
    let _ = tx.send(ToolEvent::Output(result.output[0].clone()));
    let _ = tx.send(ToolEvent::Finished(false));
    result
}

fn capture_stream<R>(
    stream: Option<R>,
    output: Arc<Mutex<Vec<String>>>,
    tx: mpsc::UnboundedSender<ToolEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(stream) = stream else { return };
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if let Ok(mut buffer) = output.lock() {
                buffer.push(line.clone());
            }
            let _ = tx.send(ToolEvent::Output(line));
        }
    })
}
