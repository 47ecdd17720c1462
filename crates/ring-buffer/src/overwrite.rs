//! Overwrite-on-Full Ingestion
//!
//! The producer side of the terminal must never block or fail because the
//! display fell behind, so incoming bytes always land in the buffer and the
//! oldest bytes are evicted to make room.

use crate::buffer::RingBuffer;

/// Result of an [`RingBuffer::ingest`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ingested {
    /// Bytes now stored from the input
    pub written: usize,
    /// Bytes that did not survive: evicted content plus any discarded input prefix
    pub dropped: usize,
}

impl RingBuffer {
    /// Store `data`, evicting the oldest bytes when space runs out.
    ///
    /// Afterwards the buffer holds the most recent `capacity` bytes of
    /// {previous content, `data`} in order.
    pub fn ingest(&mut self, data: &[u8]) -> Ingested {
        let capacity = self.capacity();

        if data.len() >= capacity {
            let dropped = self.len() + (data.len() - capacity);
            self.clear();
            let written = self.write(&data[data.len() - capacity..]);
            return Ingested { written, dropped };
        }

        let shortfall = data.len().saturating_sub(self.free_space());
        let dropped = self.discard(shortfall);
        let written = self.write(data);
        debug_assert_eq!(written, data.len());

        Ingested { written, dropped }
    }
}
