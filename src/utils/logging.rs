//! Logging initialization for nodedeck

use anyhow::Result;
use env_logger::{Builder, Target};
use log::LevelFilter;

/// Initialize stderr logging for the CLI.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };

    Builder::from_default_env()
        .target(Target::Stderr)
        .filter_level(level)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    #[cfg(debug_assertions)]
    log_panics::init();

    log::debug!("nodedeck logging initialized with level: {:?}", level);
    Ok(())
}
