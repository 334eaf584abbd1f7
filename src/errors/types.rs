//! Custom error types for nodedeck

use std::fmt;

/// Main error type for nodedeck operations
#[derive(Debug)]
pub enum NodedeckError {
    /// Configuration related errors
    Config(String),
    /// Serial transport errors
    Serial(String),
    /// External tool errors
    Tool(String),
    /// General I/O errors
    Io(std::io::Error),
    /// Serialization errors
    Serialization(String),
}

impl fmt::Display for NodedeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodedeckError::Config(msg) => write!(f, "Configuration error: {}", msg),
            NodedeckError::Serial(msg) => write!(f, "Serial error: {}", msg),
            NodedeckError::Tool(msg) => write!(f, "Tool error: {}", msg),
            NodedeckError::Io(err) => write!(f, "I/O error: {}", err),
            NodedeckError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for NodedeckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NodedeckError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NodedeckError {
    fn from(err: std::io::Error) -> Self {
        NodedeckError::Io(err)
    }
}

impl From<serde_json::Error> for NodedeckError {
    fn from(err: serde_json::Error) -> Self {
        NodedeckError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for NodedeckError {
    fn from(err: toml::de::Error) -> Self {
        NodedeckError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for NodedeckError {
    fn from(err: toml::ser::Error) -> Self {
        NodedeckError::Serialization(err.to_string())
    }
}

/// Result type alias for nodedeck operations
pub type Result<T> = std::result::Result<T, NodedeckError>;
