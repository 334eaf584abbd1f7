//! Clean command

use anyhow::Result;
use tokio::sync::mpsc;

use crate::cli::commands::{find_board, spawn_output_printer};
use crate::config::AppConfig;
use crate::services::{CancelToken, ProcessRunner};

/// Execute the clean command for one board
pub async fn execute_clean_command(config: &AppConfig, board_id: &str) -> Result<()> {
    let board = find_board(config, board_id)?;
    let Some(project) = &board.project else {
        anyhow::bail!("Board {} has no project configured", board.id);
    };

    let runner = ProcessRunner::new(config.tool_path.clone());
    let (tx, rx) = mpsc::unbounded_channel();
    let printer = spawn_output_printer(rx);

    let result = runner.clean(project, tx, CancelToken::new()).await;
    let _ = printer.await;

    if result.success {
        println!("✅ Clean of {} succeeded", board.id);
        Ok(())
    } else {
        anyhow::bail!("Clean of {} failed", board.id)
    }
}
