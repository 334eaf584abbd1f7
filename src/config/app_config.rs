//! Application configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{NodedeckError, Result};
use crate::models::BoardAssociation;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path to the PlatformIO CLI; `pio` is looked up on PATH when unset
    pub tool_path: Option<PathBuf>,
    /// Delay between a successful upload and reopening the port, in
    /// milliseconds. No handshake confirms the reboot, so this is a plain
    /// fixed wait.
    pub settle_delay_ms: u64,
    /// Baud rate used when connecting a port with no board association
    pub default_baud_rate: u32,
    /// Configured board associations
    pub boards: Vec<BoardAssociation>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tool_path: None,
            settle_delay_ms: 2000,
            default_baud_rate: 115200,
            boards: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Platform config file location: `<config dir>/nodedeck/nodedeck.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nodedeck")
            .join("nodedeck.toml")
    }

    /// Load the configuration, falling back to defaults when the file does
    /// not exist yet. The contents are taken as-is; the core performs no
    /// schema validation beyond deserialization.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)
            .map_err(|e| NodedeckError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Write the configuration, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_defaults() {
        let temp = TempDir::new().expect("create temp dir");
        let config = AppConfig::load(&temp.path().join("nodedeck.toml")).expect("load config");
        assert!(config.tool_path.is_none());
        assert_eq!(config.settle_delay_ms, 2000);
        assert!(config.boards.is_empty());
    }

    #[test]
    fn saved_boards_survive_reload() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("nodedeck.toml");

        let mut config = AppConfig::default();
        let mut board = BoardAssociation::new("CubeCell", "HTCC-AB01");
        board.port = Some("/dev/ttyUSB0".to_string());
        board.environment = Some("cubecell".to_string());
        config.boards.push(board);
        config.save(&path).expect("save config");

        let reloaded = AppConfig::load(&path).expect("reload config");
        assert_eq!(reloaded.boards.len(), 1);
        assert_eq!(reloaded.boards[0].id, "CubeCell");
        assert_eq!(reloaded.boards[0].port, Some("/dev/ttyUSB0".to_string()));
        assert_eq!(reloaded.boards[0].baud_rate, 115200);
    }
}
