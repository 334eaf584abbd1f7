//! CLI command implementations

pub mod build;
pub mod clean;
pub mod envs;
pub mod monitor;
pub mod ports;
pub mod upload;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cli::args::Commands;
use crate::config::AppConfig;
use crate::models::{BoardAssociation, ToolEvent};
use crate::serial::SerialSessionManager;
use crate::services::{BuildOrchestrator, ProcessRunner};

/// Execute a CLI command
pub async fn execute_command(
    command: Commands,
    config: &AppConfig,
    config_path: &Path,
) -> Result<()> {
    match command {
        Commands::Ports => ports::execute_ports_command().await,
        Commands::Envs { project } => envs::execute_envs_command(&project).await,
        Commands::Monitor { ports, baud_rate } => {
            monitor::execute_monitor_command(config, config_path, ports, baud_rate).await
        }
        Commands::Build { board } => build::execute_build_command(config, &board).await,
        Commands::BuildAll => build::execute_build_all_command(config).await,
        Commands::Upload { board } => upload::execute_upload_command(config, &board).await,
        Commands::UploadAll => upload::execute_upload_all_command(config).await,
        Commands::Clean { board } => clean::execute_clean_command(config, &board).await,
    }
}

/// Look up a board association by id.
pub(crate) fn find_board<'a>(config: &'a AppConfig, id: &str) -> Result<&'a BoardAssociation> {
    config
        .boards
        .iter()
        .find(|board| board.id == id)
        .ok_or_else(|| anyhow::anyhow!("No board association with id '{}' in the configuration", id))
}

/// Assemble the orchestrator over a fresh session manager.
pub(crate) fn make_orchestrator(config: &AppConfig) -> Arc<BuildOrchestrator> {
    let sessions = SerialSessionManager::new();
    let runner = ProcessRunner::new(config.tool_path.clone());
    Arc::new(BuildOrchestrator::new(
        sessions,
        runner,
        Duration::from_millis(config.settle_delay_ms),
    ))
}

/// Print tool output lines as they arrive; ends when the sender side is
/// dropped.
pub(crate) fn spawn_output_printer(
    mut rx: mpsc::UnboundedReceiver<ToolEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ToolEvent::Output(line) => println!("{}", line),
                ToolEvent::Finished(_) => {}
            }
        }
    })
}

/// Cancel the current orchestrated run on Ctrl-C.
pub(crate) fn wire_ctrl_c(orchestrator: Arc<BuildOrchestrator>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            orchestrator.cancel();
        }
    });
}

/// Summarize a batch: Ok only when every result succeeded.
pub(crate) fn report_batch(operation: &str, results: &[crate::models::OperationResult]) -> Result<()> {
    let failed = results.iter().filter(|r| !r.success).count();
    if failed == 0 {
        println!("✅ {} finished: {} board(s)", operation, results.len());
        Ok(())
    } else {
        anyhow::bail!(
            "{} finished with {} failure(s) out of {} board(s)",
            operation,
            failed,
            results.len()
        )
    }
}
