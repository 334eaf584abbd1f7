//! Serial port discovery

use anyhow::Result;

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub name: String,
    /// Human-readable description
    pub description: String,
}

/// List available serial ports that look like attached devices.
///
/// Filters the OS enumeration down to the device patterns boards actually
/// show up as:
/// - Windows: COM*
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;

    let mut infos: Vec<PortInfo> = ports
        .iter()
        .filter(|port| is_device_port(&port.port_name))
        .map(|port| PortInfo {
            name: port.port_name.clone(),
            description: describe_port(port),
        })
        .collect();

    infos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(infos)
}

fn is_device_port(port_name: &str) -> bool {
    if port_name.starts_with("COM") && port_name[3..].chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if port_name.starts_with("/dev/ttyUSB") || port_name.starts_with("/dev/ttyACM") {
        return true;
    }
    if port_name.starts_with("/dev/cu.usbserial-") || port_name.starts_with("/dev/cu.usbmodem") {
        return true;
    }
    false
}

fn describe_port(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb_info) => {
            format!(
                "USB {} {}",
                usb_info.manufacturer.as_deref().unwrap_or("Device"),
                usb_info.product.as_deref().unwrap_or("Serial Port")
            )
        }
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}
