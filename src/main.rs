//! nodedeck CLI entry point

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    nodedeck::cli::run().await
}
