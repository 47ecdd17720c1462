//! Serial Link
//!
//! Byte transport used by the terminal session. A [`Connector`] opens a
//! [`Transport`] for a port name and baud rate; the native implementation
//! talks to the OS serial driver through `tokio-serial`, and an in-memory
//! mock stands in for hardware in tests.

mod error;
pub mod mock;
mod serial;
mod transport;

pub use error::TransportError;
pub use mock::{MockConnector, MockPeer, MockTransport};
pub use serial::{available_ports, SerialConnector, SerialTransport};
pub use transport::{Connector, LinkSettings, ReadOutcome, Transport};

/// Default baud rate when none is given
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
