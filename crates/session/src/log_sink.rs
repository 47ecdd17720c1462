//! Append-only capture file for received bytes

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

struct LogSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl LogSink {
    fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()
    }
}

/// Optional capture file shared by the reader thread and the controller
///
/// Writes are best-effort: the first failure closes the file and raises the
/// failure flag instead of retrying on every chunk.
#[derive(Clone, Default)]
pub struct SharedLog {
    inner: Arc<Mutex<Option<LogSink>>>,
    failed: Arc<AtomicBool>,
}

impl SharedLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start appending to `path`, replacing any open capture file
    pub fn open(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let sink = LogSink::open(path.as_ref())?;
        info!("Logging received bytes to {}", sink.path.display());
        let previous = self.lock().replace(sink);
        if let Some(previous) = previous {
            Self::finish(previous);
        }
        self.failed.store(false, Ordering::Relaxed);
        Ok(())
    }

    /// Flush and close the capture file; returns false if none was open
    pub fn close(&self) -> bool {
        let taken = self.lock().take();
        match taken {
            Some(sink) => {
                Self::finish(sink);
                true
            }
            None => false,
        }
    }

    /// Append received bytes if logging is on
    pub fn mirror(&self, data: &[u8]) {
        let mut guard = self.lock();
        let Some(sink) = guard.as_mut() else {
            return;
        };
        if let Err(e) = sink.append(data) {
            warn!("Log write to {} failed, logging disabled: {}", sink.path.display(), e);
            self.failed.store(true, Ordering::Relaxed);
            *guard = None;
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.lock().as_ref().map(|s| s.path.clone())
    }

    /// A write failed since the last successful open
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }

    fn finish(mut sink: LogSink) {
        if let Err(e) = sink.writer.flush() {
            warn!("Flushing log {} failed: {}", sink.path.display(), e);
        }
        debug!("Closed log {}", sink.path.display());
    }

    fn lock(&self) -> MutexGuard<'_, Option<LogSink>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
