//! In-Memory Mock Transport
//!
//! Stands in for serial hardware in tests. The [`MockPeer`] plays the
//! device side: it injects inbound bytes, inspects what was written, and
//! can simulate I/O errors, open failures and missing flow control.

use crate::error::TransportError;
use crate::transport::{Connector, LinkSettings, ReadOutcome, Transport};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct Line {
    inbound: Mutex<VecDeque<u8>>,
    arrived: Condvar,
    written: Mutex<Vec<u8>>,
    failing_reads: AtomicUsize,
    reject_open: AtomicBool,
    no_flow_control: AtomicBool,
    opens: AtomicUsize,
    open_handles: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connector producing [`MockTransport`]s wired to one shared line
#[derive(Clone, Default)]
pub struct MockConnector {
    line: Arc<Line>,
}

impl MockConnector {
    /// Create a connector and the device-side handle for its line
    pub fn new() -> (Self, MockPeer) {
        let connector = Self::default();
        let peer = MockPeer {
            line: connector.line.clone(),
        };
        (connector, peer)
    }
}

impl Connector for MockConnector {
    fn open(
        &self,
        port: &str,
        settings: &LinkSettings,
    ) -> Result<Box<dyn Transport>, TransportError> {
        if settings.baud_rate == 0 {
            return Err(TransportError::InvalidBaudRate(0));
        }
        if self.line.reject_open.load(Ordering::SeqCst) {
            return Err(TransportError::OpenFailed {
                port: port.to_string(),
                reason: "mock open rejected".to_string(),
            });
        }

        self.line.opens.fetch_add(1, Ordering::SeqCst);
        self.line.open_handles.fetch_add(1, Ordering::SeqCst);
        debug!("Mock transport opened: {}", port);

        Ok(Box::new(MockTransport {
            name: port.to_string(),
            line: self.line.clone(),
            read_timeout: settings.read_timeout,
            rtscts: settings.flow_control,
            open: true,
        }))
    }
}

/// Device side of a mock line
#[derive(Clone)]
pub struct MockPeer {
    line: Arc<Line>,
}

impl MockPeer {
    /// Queue bytes for the transport to read
    pub fn inject(&self, data: &[u8]) {
        lock(&self.line.inbound).extend(data.iter().copied());
        self.line.arrived.notify_all();
    }

    /// Everything written to the line so far
    pub fn written(&self) -> Vec<u8> {
        lock(&self.line.written).clone()
    }

    /// Bytes injected but not yet read
    pub fn pending(&self) -> usize {
        lock(&self.line.inbound).len()
    }

    /// Make the next `count` reads fail with an I/O error
    pub fn fail_reads(&self, count: usize) {
        self.line.failing_reads.store(count, Ordering::SeqCst);
        self.line.arrived.notify_all();
    }

    /// Make subsequent opens fail
    pub fn reject_open(&self, reject: bool) {
        self.line.reject_open.store(reject, Ordering::SeqCst);
    }

    /// Make RTS/CTS changes fail
    pub fn disable_flow_control(&self, disabled: bool) {
        self.line.no_flow_control.store(disabled, Ordering::SeqCst);
    }

    /// Number of successful opens
    pub fn opens(&self) -> usize {
        self.line.opens.load(Ordering::SeqCst)
    }

    /// Transports opened and not yet closed
    pub fn open_handles(&self) -> usize {
        self.line.open_handles.load(Ordering::SeqCst)
    }
}

/// Transport end of a mock line
pub struct MockTransport {
    name: String,
    line: Arc<Line>,
    read_timeout: Duration,
    rtscts: bool,
    open: bool,
}

impl MockTransport {
    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.open {
            Ok(())
        } else {
            Err(TransportError::NotOpen)
        }
    }

    fn take_failure(&self) -> bool {
        self.line
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
        self.ensure_open()?;
        if self.take_failure() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock read failure").into());
        }

        let inbound = lock(&self.line.inbound);
        let (mut inbound, _) = self
            .line
            .arrived
            .wait_timeout_while(inbound, self.read_timeout, |q| q.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        if inbound.is_empty() || buf.is_empty() {
            return Ok(ReadOutcome::Timeout);
        }
        let n = buf.len().min(inbound.len());
        for (slot, byte) in buf.iter_mut().zip(inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(ReadOutcome::Data(n))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.ensure_open()?;
        lock(&self.line.written).extend_from_slice(data);
        Ok(data.len())
    }

    fn set_flow_control(&mut self, enabled: bool) -> Result<(), TransportError> {
        self.ensure_open()?;
        if self.line.no_flow_control.load(Ordering::SeqCst) {
            return Err(TransportError::FlowControlUnsupported(self.name.clone()));
        }
        self.rtscts = enabled;
        Ok(())
    }

    fn flow_control(&self) -> bool {
        self.rtscts
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn try_clone(&self) -> Result<Box<dyn Transport>, TransportError> {
        self.ensure_open()?;
        self.line.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransport {
            name: self.name.clone(),
            line: self.line.clone(),
            read_timeout: self.read_timeout,
            rtscts: self.rtscts,
            open: true,
        }))
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.line.open_handles.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LinkSettings {
        LinkSettings {
            read_timeout: Duration::from_millis(10),
            ..Default::default()
        }
    }

    #[test]
    fn test_read_injected_bytes() {
        let (connector, peer) = MockConnector::new();
        let mut transport = connector.open("mock0", &settings()).unwrap();

        peer.inject(b"hello");
        let mut buf = [0u8; 3];
        assert_eq!(transport.read(&mut buf).unwrap(), ReadOutcome::Data(3));
        assert_eq!(&buf, b"hel");
        assert_eq!(transport.read(&mut buf).unwrap(), ReadOutcome::Data(2));
        assert_eq!(&buf[..2], b"lo");
        assert_eq!(transport.read(&mut buf).unwrap(), ReadOutcome::Timeout);
    }

    #[test]
    fn test_write_is_recorded() {
        let (connector, peer) = MockConnector::new();
        let mut transport = connector.open("mock0", &settings()).unwrap();
        assert_eq!(transport.write(b"AT\r").unwrap(), 3);
        assert_eq!(peer.written(), b"AT\r");
    }

    #[test]
    fn test_injected_failures() {
        let (connector, peer) = MockConnector::new();
        let mut transport = connector.open("mock0", &settings()).unwrap();
        peer.fail_reads(1);

        let mut buf = [0u8; 4];
        assert!(matches!(transport.read(&mut buf), Err(TransportError::Io(_))));
        assert_eq!(transport.read(&mut buf).unwrap(), ReadOutcome::Timeout);
    }

    #[test]
    fn test_closed_transport_rejects_io() {
        let (connector, peer) = MockConnector::new();
        let mut transport = connector.open("mock0", &settings()).unwrap();
        assert_eq!(peer.open_handles(), 1);

        transport.close();
        assert!(!transport.is_open());
        assert_eq!(peer.open_handles(), 0);
        assert!(matches!(transport.write(b"x"), Err(TransportError::NotOpen)));
    }

    #[test]
    fn test_open_rejection_and_flow_control() {
        let (connector, peer) = MockConnector::new();
        peer.reject_open(true);
        assert!(matches!(
            connector.open("mock0", &settings()),
            Err(TransportError::OpenFailed { .. })
        ));

        peer.reject_open(false);
        let mut transport = connector.open("mock0", &settings()).unwrap();
        transport.set_flow_control(true).unwrap();
        assert!(transport.flow_control());

        peer.disable_flow_control(true);
        assert!(matches!(
            transport.set_flow_control(false),
            Err(TransportError::FlowControlUnsupported(_))
        ));
        assert!(transport.flow_control());
        assert_eq!(peer.opens(), 1);
    }

    #[test]
    fn test_clone_shares_the_line() {
        let (connector, peer) = MockConnector::new();
        let mut reader = connector.open("mock0", &settings()).unwrap();
        let mut writer = reader.try_clone().unwrap();
        assert_eq!(peer.open_handles(), 2);
        assert_eq!(peer.opens(), 1);

        assert_eq!(writer.write(b"ping").unwrap(), 4);
        assert_eq!(peer.written(), b"ping");
        peer.inject(b"pong");
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), ReadOutcome::Data(4));

        writer.close();
        assert!(reader.is_open());
        reader.close();
        assert_eq!(peer.open_handles(), 0);
        assert!(matches!(reader.try_clone(), Err(TransportError::NotOpen)));
    }
}
