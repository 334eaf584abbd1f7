//! nodedeck - Multi-Node Serial Workbench
//!
//! nodedeck monitors any number of serial ports at once, recognizes the
//! self-identification lines embedded devices print at boot, and drives the
//! PlatformIO CLI to build and upload the projects associated with those
//! devices, handing each port off cleanly between monitoring and flashing.

pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod serial;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::*;
pub use models::*;
pub use serial::{IdentificationMatcher, SerialSessionManager};
pub use services::{BuildOrchestrator, CancelToken, ProcessRunner};

/// nodedeck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// nodedeck application name
pub const APP_NAME: &str = "nodedeck";
