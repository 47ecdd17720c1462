//! Session controller
//!
//! Owns the shared buffer, the open link, the capture log and both worker
//! threads. Every method here may be called while the workers run.

use crate::config::SessionConfig;
use crate::consumer::{DisplayControls, LiveConsumer};
use crate::error::SessionError;
use crate::link::LinkSlot;
use crate::log_sink::SharedLog;
use crate::reader::TransportReader;
use crate::render::ViewMode;
use crate::stats::{SessionCounters, SessionStats};
use ring_buffer::SharedRingBuffer;
use serial_link::Connector;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// A worker thread and the flag that keeps it running
struct Worker {
    name: &'static str,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(
        name: &'static str,
        running: Arc<AtomicBool>,
        body: impl FnOnce() + Send + 'static,
    ) -> Result<Self, SessionError> {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(body)
            .map_err(|source| SessionError::Spawn { name, source })?;
        Ok(Self {
            name,
            running,
            handle: Some(handle),
        })
    }

    fn signal_stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("{} thread panicked", self.name);
            }
        }
    }
}

/// A running serial terminal session
pub struct Session {
    config: SessionConfig,
    connector: Box<dyn Connector>,
    buffer: SharedRingBuffer,
    link: LinkSlot,
    log: SharedLog,
    counters: Arc<SessionCounters>,
    controls: Arc<DisplayControls>,
    workers: Vec<Worker>,
}

impl Session {
    /// Allocate the buffer, reset counters and launch both worker threads.
    ///
    /// `display` receives rendered bytes from the live consumer.
    pub fn start(
        config: SessionConfig,
        connector: Box<dyn Connector>,
        display: Box<dyn Write + Send>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let buffer = SharedRingBuffer::new(config.buffer_capacity)?;
        info!("Ring buffer ready: {} bytes", config.buffer_capacity);

        let mut session = Self {
            connector,
            buffer,
            link: LinkSlot::new(),
            log: SharedLog::new(),
            counters: Arc::new(SessionCounters::new()),
            controls: Arc::new(DisplayControls::new(config.live, config.view)),
            workers: Vec::with_capacity(2),
            config,
        };

        let reader_running = Arc::new(AtomicBool::new(true));
        let reader = TransportReader::new(
            session.link.clone(),
            session.buffer.clone(),
            session.counters.clone(),
            session.log.clone(),
            reader_running.clone(),
        )
        .with_chunk_size(session.config.read_chunk)
        .with_idle(session.config.idle_closed(), session.config.idle_error());
        session
            .workers
            .push(Worker::spawn("serial-reader", reader_running, move || reader.run())?);

        let consumer_running = Arc::new(AtomicBool::new(true));
        let consumer = LiveConsumer::new(
            session.buffer.clone(),
            session.counters.clone(),
            session.controls.clone(),
            consumer_running.clone(),
            display,
        )
        .with_chunk_size(session.config.display_chunk)
        .with_idle(session.config.idle_paused(), session.config.idle_empty());
        session
            .workers
            .push(Worker::spawn("live-display", consumer_running, move || consumer.run())?);

        Ok(session)
    }

    /// Open `port`, closing any link that is already open
    pub fn open(&self, port: &str, baud_rate: u32) -> Result<(), SessionError> {
        self.link.close();
        let transport = self
            .connector
            .open(port, &self.config.link_settings(baud_rate))?;
        self.link.install(transport)?;
        Ok(())
    }

    /// Close the link; returns false if none was open
    pub fn close(&self) -> bool {
        self.link.close()
    }

    pub fn is_open(&self) -> bool {
        self.link.is_open()
    }

    pub fn port(&self) -> Option<String> {
        self.link.name()
    }

    /// Write raw bytes to the link
    pub fn send(&self, data: &[u8]) -> Result<usize, SessionError> {
        let written = self.link.write(data)?;
        self.counters.add_sent(written);
        debug!("Sent {}/{} bytes", written, data.len());
        Ok(written)
    }

    /// Toggle RTS/CTS on the open link
    pub fn set_flow_control(&self, enabled: bool) -> Result<(), SessionError> {
        Ok(self.link.set_flow_control(enabled)?)
    }

    pub fn flow_control(&self) -> bool {
        self.link.flow_control()
    }

    /// Pause or resume the live display
    pub fn set_live(&self, live: bool) {
        self.controls.live.store(live, Ordering::Relaxed);
    }

    pub fn is_live(&self) -> bool {
        self.controls.live.load(Ordering::Relaxed)
    }

    pub fn set_view(&self, view: ViewMode) {
        self.controls.view.store(view);
    }

    pub fn view(&self) -> ViewMode {
        self.controls.view.load()
    }

    /// Start appending received bytes to `path`
    pub fn start_logging(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        self.log
            .open(path)
            .map_err(|source| SessionError::LogOpenFailed {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Stop logging; returns false if logging was off
    pub fn stop_logging(&self) -> bool {
        self.log.close()
    }

    pub fn is_logging(&self) -> bool {
        self.log.is_active()
    }

    /// Copy up to `max` bytes from the head without consuming them
    pub fn dump(&self, max: usize) -> Vec<u8> {
        self.buffer.dump(max)
    }

    /// Logical offset of the first occurrence of `pattern`
    pub fn search(&self, pattern: &[u8]) -> Option<usize> {
        self.buffer.search(pattern)
    }

    pub fn clear(&self) {
        self.buffer.clear();
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn free_space(&self) -> usize {
        self.buffer.free_space()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Snapshot of counters, buffer occupancy and link state
    pub fn stats(&self) -> SessionStats {
        let occupancy = self.buffer.occupancy();
        let link = self.link.status();
        let log_path = self.log.path();
        SessionStats {
            received: self.counters.received(),
            sent: self.counters.sent(),
            consumed: self.counters.consumed(),
            dropped: self.counters.dropped(),
            transport_errors: self.counters.transport_errors(),
            buffered: occupancy.len,
            free: occupancy.free,
            capacity: occupancy.capacity,
            port: link.port,
            link_open: link.open,
            flow_control: link.flow_control,
            live: self.is_live(),
            view: self.view(),
            logging: log_path.is_some(),
            log_path,
            log_failed: self.log.has_failed(),
        }
    }

    /// Stop both workers, then close the log and the link
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        info!("Stopping session");
        for worker in &self.workers {
            worker.signal_stop();
        }
        for worker in &mut self.workers {
            worker.join();
        }
        self.workers.clear();

        self.log.close();
        self.link.close();
        info!("Session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("buffer", &self.buffer)
            .field("port", &self.link.name())
            .field("workers", &self.workers.len())
            .finish()
    }
}

