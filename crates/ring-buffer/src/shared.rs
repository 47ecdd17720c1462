//! Thread-Shared Ring Buffer
//!
//! The reader thread, the display thread and administrative calls all touch
//! the same buffer. Every operation here takes the one mutex for its whole
//! duration, so each call is atomic with respect to the others.

use crate::buffer::RingBuffer;
use crate::error::BufferError;
use crate::overwrite::Ingested;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Consistent occupancy snapshot taken under a single lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub len: usize,
    pub free: usize,
    pub capacity: usize,
}

/// Cloneable, mutex-guarded handle to one [`RingBuffer`]
#[derive(Clone)]
pub struct SharedRingBuffer {
    inner: Arc<Mutex<RingBuffer>>,
}

impl SharedRingBuffer {
    /// Allocate a new shared buffer
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        Ok(Self::from_buffer(RingBuffer::new(capacity)?))
    }

    fn from_buffer(buffer: RingBuffer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(buffer)),
        }
    }

    pub fn ingest(&self, data: &[u8]) -> Ingested {
        self.lock().ingest(data)
    }

    pub fn write(&self, data: &[u8]) -> usize {
        self.lock().write(data)
    }

    pub fn read(&self, out: &mut [u8]) -> usize {
        self.lock().read(out)
    }

    pub fn peek(&self, out: &mut [u8], offset: usize) -> usize {
        self.lock().peek(out, offset)
    }

    /// Copy up to `max` bytes from the head without consuming them
    pub fn dump(&self, max: usize) -> Vec<u8> {
        let buffer = self.lock();
        let mut out = vec![0u8; max.min(buffer.len())];
        let n = buffer.peek(&mut out, 0);
        out.truncate(n);
        out
    }

    pub fn search(&self, pattern: &[u8]) -> Option<usize> {
        self.lock().search(pattern)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn free_space(&self) -> usize {
        self.lock().free_space()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    pub fn occupancy(&self) -> Occupancy {
        let buffer = self.lock();
        Occupancy {
            len: buffer.len(),
            free: buffer.free_space(),
            capacity: buffer.capacity(),
        }
    }

    // A panic while holding the lock cannot leave head/tail/used
    // inconsistent: every mutation updates them after the copy succeeds.
    fn lock(&self) -> MutexGuard<'_, RingBuffer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SharedRingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", &*self.lock())
    }
}
