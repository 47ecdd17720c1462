//! Shared slot holding the currently open transport

use serial_link::{ReadOutcome, Transport, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

/// Write handle and the state the command surface queries
struct Control {
    name: String,
    writer: Box<dyn Transport>,
}

#[derive(Default)]
struct Shared {
    /// Held by the reader thread for one bounded read at a time
    reader: Mutex<Option<Box<dyn Transport>>>,
    /// Never held across a read
    control: Mutex<Option<Control>>,
    open: AtomicBool,
}

/// Link state as seen by status queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStatus {
    pub port: Option<String>,
    pub open: bool,
    pub flow_control: bool,
}

/// The open transport, if any, shared by the reader thread and the controller.
///
/// The port is held through two handles. The reader thread blocks on the
/// read handle; writes, RTS/CTS changes and status queries go through a
/// cloned handle behind a separate lock and never wait on a read. Only
/// `install` and `close` wait for an in-flight read to finish.
#[derive(Clone, Default)]
pub struct LinkSlot {
    shared: Arc<Shared>,
}

impl LinkSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly opened transport, closing any previous one
    pub fn install(&self, transport: Box<dyn Transport>) -> Result<(), TransportError> {
        let writer = transport.try_clone()?;
        self.close();

        let name = transport.name().to_string();
        *lock(&self.shared.reader) = Some(transport);
        *lock(&self.shared.control) = Some(Control { name, writer });
        self.shared.open.store(true, Ordering::Release);
        Ok(())
    }

    /// Close and remove the transport; returns false if none was installed
    pub fn close(&self) -> bool {
        self.shared.open.store(false, Ordering::Release);
        let control = lock(&self.shared.control).take();
        let reader = lock(&self.shared.reader).take();

        if let Some(mut control) = control {
            info!("Closing link {}", control.name);
            control.writer.close();
        }
        match reader {
            Some(mut reader) => {
                reader.close();
                true
            }
            None => false,
        }
    }

    /// One bounded read on the read handle
    pub fn read(&self, buf: &mut [u8]) -> Result<ReadOutcome, TransportError> {
        if !self.shared.open.load(Ordering::Acquire) {
            return Err(TransportError::NotOpen);
        }
        match lock(&self.shared.reader).as_deref_mut() {
            Some(reader) if reader.is_open() => reader.read(buf),
            _ => Err(TransportError::NotOpen),
        }
    }

    /// Write through the write handle
    pub fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        self.with_control(|control| control.writer.write(data))
    }

    pub fn set_flow_control(&self, enabled: bool) -> Result<(), TransportError> {
        self.with_control(|control| control.writer.set_flow_control(enabled))
    }

    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }

    /// Name of the installed transport
    pub fn name(&self) -> Option<String> {
        lock(&self.shared.control).as_ref().map(|c| c.name.clone())
    }

    pub fn flow_control(&self) -> bool {
        lock(&self.shared.control)
            .as_ref()
            .map_or(false, |c| c.writer.flow_control())
    }

    /// Port, open state and RTS/CTS under a single lock
    pub fn status(&self) -> LinkStatus {
        let control = lock(&self.shared.control);
        match control.as_ref() {
            Some(c) => LinkStatus {
                port: Some(c.name.clone()),
                open: self.is_open(),
                flow_control: c.writer.flow_control(),
            },
            None => LinkStatus::default(),
        }
    }

    fn with_control<R>(
        &self,
        f: impl FnOnce(&mut Control) -> Result<R, TransportError>,
    ) -> Result<R, TransportError> {
        match lock(&self.shared.control).as_mut() {
            Some(control) if control.writer.is_open() => f(control),
            _ => Err(TransportError::NotOpen),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
