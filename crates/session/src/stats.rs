//! Session counters and status snapshot

use crate::render::ViewMode;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic byte counters shared by the worker threads
///
/// Independent atomics, not guarded by the buffer lock.
#[derive(Debug, Default)]
pub struct SessionCounters {
    received: AtomicU64,
    sent: AtomicU64,
    consumed: AtomicU64,
    dropped: AtomicU64,
    transport_errors: AtomicU64,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_received(&self, n: usize) {
        self.received.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_sent(&self, n: usize) {
        self.sent.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_consumed(&self, n: usize) {
        self.consumed.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_dropped(&self, n: usize) {
        self.dropped.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn consumed(&self) -> u64 {
        self.consumed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn transport_errors(&self) -> u64 {
        self.transport_errors.load(Ordering::Relaxed)
    }
}

/// Point-in-time session status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    /// Bytes read from the link
    pub received: u64,
    /// Bytes written to the link
    pub sent: u64,
    /// Bytes drained by the live display
    pub consumed: u64,
    /// Oldest bytes evicted to make room
    pub dropped: u64,
    /// Failed reads since the session started
    pub transport_errors: u64,
    /// Bytes currently buffered
    pub buffered: usize,
    pub free: usize,
    pub capacity: usize,
    pub port: Option<String>,
    pub link_open: bool,
    pub flow_control: bool,
    pub live: bool,
    pub view: ViewMode,
    pub logging: bool,
    /// Capture file while logging is on
    pub log_path: Option<PathBuf>,
    /// A log write failed and logging was switched off
    pub log_failed: bool,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RX={}  TX={}  shown={}  dropped(oldest)={}  errors={}  rb(size={} free={} cap={})",
            self.received,
            self.sent,
            self.consumed,
            self.dropped,
            self.transport_errors,
            self.buffered,
            self.free,
            self.capacity
        )?;
        match &self.port {
            Some(port) if self.link_open => write!(f, "  link={} (open)", port)?,
            Some(port) => write!(f, "  link={} (down)", port)?,
            None => write!(f, "  link=closed")?,
        }
        if self.log_failed {
            write!(f, "  log=FAILED")?;
        } else if let Some(path) = &self.log_path {
            write!(f, "  log={}", path.display())?;
        }
        Ok(())
    }
}
