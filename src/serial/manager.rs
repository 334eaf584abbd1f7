//! Concurrent serial session management
//!
//! The manager owns every open session, keyed by port name. Each session
//! runs its own reader task that frames incoming bytes into lines, applies
//! the identification matcher, and fans events out over a broadcast
//! channel. Event sends never happen while the table lock is held, so a
//! subscriber is free to call back into connect/disconnect.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf};
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio_serial::{SerialPort, SerialStream};

use crate::errors::{NodedeckError, Result};
use crate::models::SerialEvent;
use crate::serial::ident::IdentificationMatcher;
use crate::serial::session::{SerialSession, SessionInfo, SharedWriter};

const EVENT_CHANNEL_CAPACITY: usize = 1000;

// Short timeout keeps reads best-effort drains instead of long blocks.
const PORT_TIMEOUT: Duration = Duration::from_millis(10);

type SessionTable = Arc<RwLock<HashMap<String, SerialSession>>>;

/// Owns the set of open serial sessions. Cloning yields another handle to
/// the same session table and event stream.
#[derive(Clone)]
pub struct SerialSessionManager {
    sessions: SessionTable,
    events: broadcast::Sender<SerialEvent>,
}

impl SerialSessionManager {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    /// Subscribe to the serial event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<SerialEvent> {
        self.events.subscribe()
    }

    /// Open a session on `port`. An existing session on the same port is
    /// closed first, so re-connecting always starts clean. Returns false
    /// and emits an error event when the port cannot be opened.
    pub async fn connect(&self, port: &str, baud_rate: u32) -> bool {
        self.disconnect(port).await;

        let stream = match open_stream(port, baud_rate) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to open serial port {}: {}", port, e);
                self.send_event(SerialEvent::Error(port.to_string(), e.to_string()));
                return false;
            }
        };

        let (read_half, write_half) = tokio::io::split(stream);
        let writer: SharedWriter = Arc::new(Mutex::new(write_half));

        let reader_task = tokio::spawn(read_loop(
            port.to_string(),
            read_half,
            self.sessions.clone(),
            self.events.clone(),
        ));

        let session = SerialSession {
            port: port.to_string(),
            baud_rate,
            writer,
            identified_id: None,
            identified_board: None,
            reader_task,
        };
        self.sessions
            .write()
            .await
            .insert(port.to_string(), session);

        debug!("Opened serial session on {} at {} baud", port, baud_rate);
        true
    }

    /// Close and release the session on `port`. No-op when the port is not
    /// open.
    pub async fn disconnect(&self, port: &str) {
        let session = self.sessions.write().await.remove(port);
        if let Some(session) = session {
            session.close();
            debug!("Closed serial session on {}", port);
        }
    }

    /// Close every open session, e.g. before a batch upload.
    pub async fn disconnect_all(&self) {
        let sessions: Vec<SerialSession> = {
            let mut table = self.sessions.write().await;
            table.drain().map(|(_, session)| session).collect()
        };
        for session in sessions {
            debug!("Closed serial session on {}", session.port);
            session.close();
        }
    }

    pub async fn is_connected(&self, port: &str) -> bool {
        self.sessions.read().await.contains_key(port)
    }

    /// Best-effort write to an open session. Silently does nothing when the
    /// port is not open.
    pub async fn write(&self, port: &str, text: &str) {
        let writer = {
            let table = self.sessions.read().await;
            match table.get(port) {
                Some(session) => session.writer.clone(),
                None => return,
            }
        };

        let mut writer = writer.lock().await;
        if let Err(e) = writer.write_all(text.as_bytes()).await {
            debug!("Write to {} failed: {}", port, e);
            return;
        }
        if let Err(e) = writer.flush().await {
            debug!("Flush of {} failed: {}", port, e);
        }
    }

    /// Snapshot of the currently open sessions, sorted by port name.
    pub async fn list_active_sessions(&self) -> Vec<SessionInfo> {
        let table = self.sessions.read().await;
        let mut sessions: Vec<SessionInfo> = table.values().map(|s| s.info()).collect();
        sessions.sort_by(|a, b| a.port.cmp(&b.port));
        sessions
    }

    fn send_event(&self, event: SerialEvent) {
        // Ignore send failures: no subscribers means nobody to notify.
        let _ = self.events.send(event);
    }
}

impl Default for SerialSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Open the port with a short timeout and the modem control lines asserted,
/// so boards held in reset by DTR/RTS start talking right away.
fn open_stream(port: &str, baud_rate: u32) -> Result<SerialStream> {
    let builder = tokio_serial::new(port, baud_rate).timeout(PORT_TIMEOUT);
    let mut stream = SerialStream::open(&builder)
        .map_err(|e| NodedeckError::Serial(format!("{}: {}", port, e)))?;
    stream
        .write_data_terminal_ready(true)
        .map_err(|e| NodedeckError::Serial(format!("{}: failed to set DTR: {}", port, e)))?;
    stream
        .write_request_to_send(true)
        .map_err(|e| NodedeckError::Serial(format!("{}: failed to set RTS: {}", port, e)))?;
    Ok(stream)
}

/// Per-session reader: frame lines, emit raw-line events, run the
/// identification matcher. A read error is reported and ends the loop; the
/// table entry stays until the caller disconnects.
async fn read_loop(
    port: String,
    read_half: ReadHalf<SerialStream>,
    sessions: SessionTable,
    events: broadcast::Sender<SerialEvent>,
) {
    let matcher = IdentificationMatcher::new();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = events.send(SerialEvent::Line(port.clone(), line.clone()));

                if let Some(ident) = matcher.matches(&line) {
                    // Update the stored identity under the table lock, then
                    // dispatch with the lock released. Devices may
                    // re-announce, so every match emits.
                    {
                        let mut table = sessions.write().await;
                        if let Some(session) = table.get_mut(&port) {
                            session.identified_id = Some(ident.device_id.clone());
                            session.identified_board = Some(ident.board_type.clone());
                        }
                    }
                    let _ = events.send(SerialEvent::Identified(
                        port.clone(),
                        ident.device_id,
                        ident.board_type,
                    ));
                }
            }
            Ok(None) => {
                debug!("Serial stream on {} reached end of input", port);
                break;
            }
            Err(e) => {
                warn!("Read error on {}: {}", port, e);
                let _ = events.send(SerialEvent::Error(port.clone(), e.to_string()));
                break;
            }
        }
    }
}
