//! Byte Ring Buffer
//!
//! Fixed-capacity byte store used between a serial reader thread and the
//! live display. Provides wraparound-safe write/read/peek/search, an
//! overwrite-on-full ingest path that never blocks the producer, and a
//! mutex-guarded handle for sharing one buffer across threads.

mod buffer;
mod error;
mod overwrite;
mod shared;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};
pub use error::BufferError;
pub use overwrite::Ingested;
pub use shared::{Occupancy, SharedRingBuffer};
