//! A single open serial connection

use std::sync::Arc;
use tokio::io::WriteHalf;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_serial::SerialStream;

/// Write half of an open port, shared so writes take this mutex only and
/// never the session table lock.
pub type SharedWriter = Arc<Mutex<WriteHalf<SerialStream>>>;

/// One open serial connection, owned exclusively by the session manager
pub struct SerialSession {
    pub port: String,
    pub baud_rate: u32,
    pub writer: SharedWriter,
    pub identified_id: Option<String>,
    pub identified_board: Option<String>,
    pub reader_task: JoinHandle<()>,
}

impl SerialSession {
    /// Stop the reader and release the port handle.
    pub fn close(self) {
        self.reader_task.abort();
        // Dropping the writer releases the underlying handle once the
        // aborted reader has dropped its half.
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            identified_id: self.identified_id.clone(),
            identified_board: self.identified_board.clone(),
        }
    }
}

/// Snapshot descriptor of an open session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub port: String,
    pub baud_rate: u32,
    pub identified_id: Option<String>,
    pub identified_board: Option<String>,
}
