//! Session Error Types

use ring_buffer::BufferError;
use serial_link::TransportError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by session control calls
///
/// I/O failures inside the worker loops never reach here; they are retried
/// and only show up in [`crate::SessionStats`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// Ring buffer could not be created
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Serial link operation failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Log file could not be opened for appending
    #[error("Failed to open log file {path}: {source}")]
    LogOpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Worker thread could not be spawned
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
