//! Transport Capability Interface

use crate::error::TransportError;
use std::time::Duration;

/// Default read timeout; reads return at least this often so reader loops
/// can observe their stop flag
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

/// Outcome of a single transport read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n > 0` bytes were placed at the start of the buffer
    Data(usize),
    /// Nothing arrived before the read timeout
    Timeout,
}

/// Line settings applied when a port is opened (always 8N1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    /// Baud rate (e.g. 115200)
    pub baud_rate: u32,
    /// Upper bound on how long a read may wait for data
    pub read_timeout: Duration,
    /// RTS/CTS hardware flow control
    pub flow_control: bool,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: crate::DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            flow_control: false,
        }
    }
}

impl LinkSettings {
    /// Default settings at the given baud rate
    pub fn with_baud(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Default::default()
        }
    }
}

/// An open byte channel
pub trait Transport: Send {
    /// Port name the transport was opened with
    fn name(&self) -> &str;

    /// Read whatever is available, waiting at most the configured timeout
    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError>;

    /// Write bytes, returning how many the driver accepted
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Enable or disable RTS/CTS
    fn set_flow_control(&mut self, enabled: bool) -> Result<(), TransportError>;

    /// Whether RTS/CTS is currently enabled
    fn flow_control(&self) -> bool;

    fn is_open(&self) -> bool;

    /// Open a second handle on the same port, used to write and change
    /// settings while another thread blocks in `read`
    fn try_clone(&self) -> Result<Box<dyn Transport>, TransportError>;

    /// Release the underlying handle; further I/O fails with `NotOpen`
    fn close(&mut self);
}

/// Opens transports by name
pub trait Connector: Send + Sync {
    fn open(&self, port: &str, settings: &LinkSettings)
        -> Result<Box<dyn Transport>, TransportError>;
}
