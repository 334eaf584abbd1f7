//! Project environment listing command

use anyhow::Result;
use std::path::Path;

use crate::services::ProcessRunner;

/// Execute the envs command
pub async fn execute_envs_command(project: &Path) -> Result<()> {
    let environments = ProcessRunner::list_environments(project);

    if environments.is_empty() {
        println!(
            "No environments found in {}",
            project.join("platformio.ini").display()
        );
        return Ok(());
    }

    for environment in environments {
        println!("{}", environment);
    }
    Ok(())
}
