//! Configuration management for nodedeck

pub mod app_config;

pub use app_config::*;
