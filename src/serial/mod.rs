//! Serial session management and device identification

pub mod ident;
pub mod manager;
pub mod ports;
pub mod session;

pub use ident::{IdentificationMatcher, IdentificationResult};
pub use manager::SerialSessionManager;
pub use ports::{PortInfo, list_ports};
pub use session::SessionInfo;
