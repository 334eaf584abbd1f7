//! Board association records

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_baud_rate() -> u32 {
    115200
}

/// Association between a logical device and its port/project configuration.
///
/// The `port` field is a lookup key into the session table, not an owning
/// reference: when the session is gone the association simply fails to
/// resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardAssociation {
    /// Device id the firmware announces at boot
    pub id: String,
    /// Board hardware type the firmware announces
    pub board_type: String,
    /// Serial port the device was last seen on
    pub port: Option<String>,
    /// Baud rate used when monitoring this board
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// PlatformIO project directory associated with this board
    pub project: Option<PathBuf>,
    /// PlatformIO environment to build and upload
    pub environment: Option<String>,
}

impl BoardAssociation {
    pub fn new(id: impl Into<String>, board_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            board_type: board_type.into(),
            port: None,
            baud_rate: default_baud_rate(),
            project: None,
            environment: None,
        }
    }
}

/// Apply a device identification to the board list.
///
/// The first association in existing order that matches the announced id or
/// board type and whose port is still unset gets the announcing port.
/// Returns true when a record was updated.
pub fn auto_associate(
    boards: &mut [BoardAssociation],
    port: &str,
    device_id: &str,
    board_type: &str,
) -> bool {
    for board in boards.iter_mut() {
        if board.port.is_none() && (board.id == device_id || board.board_type == board_type) {
            board.port = Some(port.to_string());
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(id: &str, board_type: &str, port: Option<&str>) -> BoardAssociation {
        let mut b = BoardAssociation::new(id, board_type);
        b.port = port.map(|p| p.to_string());
        b
    }

    #[test]
    fn associates_first_match_by_id() {
        let mut boards = vec![
            board("node-a", "HTCC-AB01", None),
            board("node-b", "HTCC-AB01", None),
        ];

        assert!(auto_associate(
            &mut boards,
            "/dev/ttyUSB0",
            "node-b",
            "other-board"
        ));
        assert_eq!(boards[0].port, None);
        assert_eq!(boards[1].port, Some("/dev/ttyUSB0".to_string()));
    }

    #[test]
    fn associates_by_board_type_when_id_unknown() {
        let mut boards = vec![
            board("node-a", "HTCC-AB01", None),
            board("node-b", "esp32dev", None),
        ];

        assert!(auto_associate(
            &mut boards,
            "/dev/ttyACM1",
            "unknown",
            "esp32dev"
        ));
        assert_eq!(boards[1].port, Some("/dev/ttyACM1".to_string()));
    }

    #[test]
    fn skips_records_with_a_port_already_set() {
        let mut boards = vec![
            board("node-a", "HTCC-AB01", Some("/dev/ttyUSB3")),
            board("node-a", "HTCC-AB01", None),
        ];

        assert!(auto_associate(
            &mut boards,
            "/dev/ttyUSB0",
            "node-a",
            "HTCC-AB01"
        ));
        assert_eq!(boards[0].port, Some("/dev/ttyUSB3".to_string()));
        assert_eq!(boards[1].port, Some("/dev/ttyUSB0".to_string()));
    }

    #[test]
    fn no_match_leaves_the_list_untouched() {
        let mut boards = vec![board("node-a", "HTCC-AB01", None)];

        assert!(!auto_associate(
            &mut boards,
            "/dev/ttyUSB0",
            "node-x",
            "uno"
        ));
        assert_eq!(boards[0].port, None);
    }
}
