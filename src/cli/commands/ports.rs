//! Serial port listing command

use anyhow::Result;

use crate::serial::list_ports;

/// Execute the ports command
pub async fn execute_ports_command() -> Result<()> {
    let ports = list_ports()?;

    if ports.is_empty() {
        println!("No serial devices found");
        return Ok(());
    }

    for port in ports {
        println!("{}  {}", port.name, port.description);
    }
    Ok(())
}
