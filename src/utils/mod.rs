//! Utility functions and helpers used throughout nodedeck

pub mod logging;
