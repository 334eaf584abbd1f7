//! Error types for nodedeck

pub mod types;

pub use types::*;
