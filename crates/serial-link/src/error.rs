//! Transport Error Types

use thiserror::Error;

/// Errors that can occur on a byte transport
///
/// A read timeout is not an error; see [`crate::ReadOutcome::Timeout`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// Port could not be opened or configured
    #[error("Failed to open {port}: {reason}")]
    OpenFailed { port: String, reason: String },

    /// Baud rate rejected before touching the driver
    #[error("Unsupported baud rate: {0}")]
    InvalidBaudRate(u32),

    /// Read or write failed on an open port
    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Hardware flow control could not be changed
    #[error("RTS/CTS flow control not supported on {0}")]
    FlowControlUnsupported(String),

    /// Operation on a closed transport
    #[error("Transport is not open")]
    NotOpen,
}
