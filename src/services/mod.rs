//! Services driving the external tool and orchestrating operations

pub mod cancel;
pub mod orchestrator;
pub mod runner;

pub use cancel::CancelToken;
pub use orchestrator::{BuildOrchestrator, RunState};
pub use runner::ProcessRunner;
