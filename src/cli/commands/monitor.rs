//! Serial monitor command
//!
//! Opens the requested ports, prints the line stream, and applies device
//! self-identification to the configured board associations.

use anyhow::Result;
use log::warn;
use std::path::Path;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::models::{SerialEvent, auto_associate};
use crate::serial::SerialSessionManager;

/// Execute the monitor command
pub async fn execute_monitor_command(
    config: &AppConfig,
    config_path: &Path,
    ports: Vec<String>,
    baud_rate: Option<u32>,
) -> Result<()> {
    let sessions = SerialSessionManager::new();
    let mut events = sessions.subscribe();

    let targets = resolve_targets(config, ports, baud_rate)?;

    let mut opened = 0;
    for (port, baud) in &targets {
        if sessions.connect(port, *baud).await {
            println!("📺 Monitoring {} at {} baud", port, baud);
            opened += 1;
        }
    }
    if opened == 0 {
        anyhow::bail!("Could not open any of the requested ports");
    }

    let mut boards = config.boards.clone();
    let mut associations_changed = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(SerialEvent::Line(port, line)) => {
                    println!("[{}] {}", port, line);
                }
                Ok(SerialEvent::Identified(port, device_id, board_type)) => {
                    println!("🔎 {} identified as {} ({})", port, device_id, board_type);
                    if auto_associate(&mut boards, &port, &device_id, &board_type) {
                        associations_changed = true;
                    }
                }
                Ok(SerialEvent::Error(port, cause)) => {
                    eprintln!("⚠️  {}: {}", port, cause);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Dropped {} serial events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    sessions.disconnect_all().await;

    if associations_changed {
        let mut updated = config.clone();
        updated.boards = boards;
        updated.save(config_path)?;
        println!(
            "💾 Saved updated board associations to {}",
            config_path.display()
        );
    }
    Ok(())
}

/// Resolve which ports to open and at which baud rate: explicit ports when
/// given, otherwise every board association carrying a port.
fn resolve_targets(
    config: &AppConfig,
    ports: Vec<String>,
    baud_rate: Option<u32>,
) -> Result<Vec<(String, u32)>> {
    if ports.is_empty() {
        let targets: Vec<(String, u32)> = config
            .boards
            .iter()
            .filter_map(|board| board.port.clone().map(|port| (port, board.baud_rate)))
            .collect();
        if targets.is_empty() {
            anyhow::bail!("No ports given and no board association has a port set");
        }
        return Ok(targets);
    }

    Ok(ports
        .into_iter()
        .map(|port| {
            let baud = baud_rate
                .or_else(|| {
                    config
                        .boards
                        .iter()
                        .find(|board| board.port.as_deref() == Some(port.as_str()))
                        .map(|board| board.baud_rate)
                })
                .unwrap_or(config.default_baud_rate);
            (port, baud)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoardAssociation;

    fn config_with_board(port: Option<&str>, baud_rate: u32) -> AppConfig {
        let mut config = AppConfig::default();
        let mut board = BoardAssociation::new("node-a", "esp32dev");
        board.port = port.map(|p| p.to_string());
        board.baud_rate = baud_rate;
        config.boards.push(board);
        config
    }

    #[test]
    fn defaults_to_configured_board_ports() {
        let config = config_with_board(Some("/dev/ttyUSB0"), 9600);
        let targets = resolve_targets(&config, Vec::new(), None).expect("targets");
        assert_eq!(targets, vec![("/dev/ttyUSB0".to_string(), 9600)]);
    }

    #[test]
    fn explicit_port_picks_up_association_baud() {
        let config = config_with_board(Some("/dev/ttyUSB0"), 57600);
        let targets =
            resolve_targets(&config, vec!["/dev/ttyUSB0".to_string()], None).expect("targets");
        assert_eq!(targets, vec![("/dev/ttyUSB0".to_string(), 57600)]);
    }

    #[test]
    fn unknown_port_falls_back_to_default_baud() {
        let config = config_with_board(None, 57600);
        let targets =
            resolve_targets(&config, vec!["/dev/ttyACM3".to_string()], None).expect("targets");
        assert_eq!(
            targets,
            vec![("/dev/ttyACM3".to_string(), config.default_baud_rate)]
        );
    }

    #[test]
    fn no_ports_anywhere_is_an_error() {
        let config = config_with_board(None, 115200);
        assert!(resolve_targets(&config, Vec::new(), None).is_err());
    }
}
