//! Build commands

use anyhow::Result;
use tokio::sync::mpsc;

use crate::cli::commands::{find_board, make_orchestrator, report_batch, spawn_output_printer, wire_ctrl_c};
use crate::config::AppConfig;

/// Execute the build command for one board
pub async fn execute_build_command(config: &AppConfig, board_id: &str) -> Result<()> {
    let board = find_board(config, board_id)?;
    let orchestrator = make_orchestrator(config);

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = spawn_output_printer(rx);
    wire_ctrl_c(orchestrator.clone());

    let result = orchestrator.build_one(board, tx).await;
    let _ = printer.await;

    if result.success {
        println!("✅ Build of {} succeeded", board.id);
        Ok(())
    } else {
        anyhow::bail!("Build of {} failed", board.id)
    }
}

/// Execute the build-all command
pub async fn execute_build_all_command(config: &AppConfig) -> Result<()> {
    let orchestrator = make_orchestrator(config);

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = spawn_output_printer(rx);
    wire_ctrl_c(orchestrator.clone());

    let results = orchestrator.build_all(&config.boards, tx).await;
    let _ = printer.await;

    report_batch("Build", &results)
}
