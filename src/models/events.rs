//! Events flowing between the core components and their subscribers

/// Events fanned out by the serial session manager.
///
/// Events from one port are delivered in the order the bytes arrived;
/// events across ports have no defined relative order.
#[derive(Debug, Clone)]
pub enum SerialEvent {
    Line(String, String),               // port, line
    Identified(String, String, String), // port, device_id, board_type
    Error(String, String),              // port, cause
}

/// Events emitted while an external tool invocation runs
#[derive(Debug, Clone)]
pub enum ToolEvent {
    Output(String), // captured stdout/stderr line, in arrival order
    Finished(bool), // success
}
