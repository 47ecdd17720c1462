//! Byte Ring Buffer Implementation

use crate::error::BufferError;
use std::fmt;
use std::ops::Range;

/// Default buffer capacity (64 KiB)
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Bytes shown by the `Debug` output before truncating with `...`
const DEBUG_PREVIEW_BYTES: usize = 32;

/// Physical ranges covering one logical window, in logical order.
///
/// The window can straddle the end of the backing array, so it is split into
/// at most two contiguous pieces: `first` runs towards the physical end,
/// `second` (possibly empty) continues from index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segments {
    first: Range<usize>,
    second: Range<usize>,
}

/// Fixed-capacity byte ring buffer
///
/// Logical offset `i` (0 = oldest byte) lives at physical index
/// `(head + i) % capacity`. Empty and full both have `head == tail`; `used`
/// is the only source of truth for occupancy.
pub struct RingBuffer {
    /// Pre-allocated storage
    storage: Box<[u8]>,
    /// Capacity of the buffer, never zero
    capacity: usize,
    /// Physical index of the oldest unread byte
    head: usize,
    /// Physical index of the next write
    tail: usize,
    /// Number of valid bytes
    used: usize,
}

impl RingBuffer {
    /// Create an empty buffer holding exactly `capacity` bytes
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::InvalidCapacity);
        }

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| BufferError::AllocationFailed { capacity })?;
        storage.resize(capacity, 0u8);

        Ok(Self {
            storage: storage.into_boxed_slice(),
            capacity,
            head: 0,
            tail: 0,
            used: 0,
        })
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the number of bytes currently stored
    pub fn len(&self) -> usize {
        self.used
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.used == self.capacity
    }

    /// Remaining space in bytes
    pub fn free_space(&self) -> usize {
        self.capacity - self.used
    }

    /// Fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.used as f64 / self.capacity as f64
    }

    /// Append as many bytes as fit, returning how many were written.
    ///
    /// A full buffer or a short write is not an error; the caller decides
    /// what to do with the remainder.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.free_space());
        if n == 0 {
            return 0;
        }

        let Segments { first, second } = self.segments(self.tail, n);
        let split = first.len();
        self.storage[first].copy_from_slice(&data[..split]);
        self.storage[second].copy_from_slice(&data[split..n]);

        self.tail = self.wrap(self.tail + n);
        self.used += n;
        n
    }

    /// Remove up to `out.len()` of the oldest bytes into `out`
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let n = self.copy_out(0, out);
        self.advance_head(n);
        n
    }

    /// Copy bytes starting at `offset` without consuming them.
    ///
    /// Returns 0 when `offset >= len()`.
    pub fn peek(&self, out: &mut [u8], offset: usize) -> usize {
        self.copy_out(offset, out)
    }

    /// Drop up to `count` of the oldest bytes without copying them
    pub fn discard(&mut self, count: usize) -> usize {
        let n = count.min(self.used);
        self.advance_head(n);
        n
    }

    /// Byte at logical offset `index`
    pub fn get(&self, index: usize) -> Option<u8> {
        (index < self.used).then(|| self.byte_at(index))
    }

    /// Iterate over the stored bytes, oldest first
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.used).map(move |i| self.byte_at(i))
    }

    /// Copy all stored bytes out in logical order without consuming them
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.used];
        self.copy_out(0, &mut out);
        out
    }

    /// Find the first logical offset where `pattern` starts.
    ///
    /// An empty pattern matches at 0; a pattern longer than the stored data
    /// never matches.
    pub fn search(&self, pattern: &[u8]) -> Option<usize> {
        if pattern.is_empty() {
            return Some(0);
        }
        if pattern.len() > self.used {
            return None;
        }
        self.naive_find(pattern)
    }

    /// Reset to empty. Storage bytes are left in place, not zeroed.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.used = 0;
    }

    // O(used * pattern.len()); buffers are bounded so this stays cheap.
    fn naive_find(&self, pattern: &[u8]) -> Option<usize> {
        let limit = self.used - pattern.len();
        (0..=limit).find(|&pos| {
            pattern
                .iter()
                .enumerate()
                .all(|(k, &b)| self.byte_at(pos + k) == b)
        })
    }

    fn copy_out(&self, offset: usize, out: &mut [u8]) -> usize {
        if offset >= self.used {
            return 0;
        }
        let n = out.len().min(self.used - offset);
        if n == 0 {
            return 0;
        }

        let start = self.wrap(self.head + offset);
        let Segments { first, second } = self.segments(start, n);
        let split = first.len();
        out[..split].copy_from_slice(&self.storage[first]);
        out[split..n].copy_from_slice(&self.storage[second]);
        n
    }

    fn advance_head(&mut self, n: usize) {
        self.head = self.wrap(self.head + n);
        self.used -= n;
    }

    fn byte_at(&self, logical: usize) -> u8 {
        self.storage[self.wrap(self.head + logical)]
    }

    fn segments(&self, start: usize, len: usize) -> Segments {
        debug_assert!(start < self.capacity);
        debug_assert!(len <= self.capacity);
        let first_len = len.min(self.capacity - start);
        Segments {
            first: start..start + first_len,
            second: 0..len - first_len,
        }
    }

    fn wrap(&self, index: usize) -> usize {
        index % self.capacity
    }
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[cap={} size={} head={} tail={}] data:",
            self.capacity, self.used, self.head, self.tail
        )?;
        for byte in self.iter().take(DEBUG_PREVIEW_BYTES) {
            write!(f, " {:02X}", byte)?;
        }
        if self.used > DEBUG_PREVIEW_BYTES {
            write!(f, " ...")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    fn assert_invariants(buffer: &RingBuffer) {
        assert!(buffer.used <= buffer.capacity);
        assert!(buffer.head < buffer.capacity);
        assert!(buffer.tail < buffer.capacity);
        let span = (buffer.tail + buffer.capacity - buffer.head) % buffer.capacity;
        if buffer.used == buffer.capacity {
            assert_eq!(span, 0);
        } else {
            assert_eq!(span, buffer.used);
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(RingBuffer::new(0).unwrap_err(), BufferError::InvalidCapacity);
    }

    #[test]
    fn test_new_is_empty() {
        let buffer = RingBuffer::new(16).unwrap();
        assert_eq!(buffer.capacity(), 16);
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.free_space(), 16);
        assert!(buffer.is_empty());
        assert_eq!(buffer.fill_ratio(), 0.0);
    }

    #[test]
    fn test_write_and_read_in_order() {
        let mut buffer = RingBuffer::new(10).unwrap();
        assert_eq!(buffer.write(b"hello"), 5);

        let mut out = [0u8; 5];
        assert_eq!(buffer.read(&mut out), 5);
        assert_eq!(&out, b"hello");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_write_is_best_effort() {
        let mut buffer = RingBuffer::new(4).unwrap();
        assert_eq!(buffer.write(b"abcdef"), 4);
        assert!(buffer.is_full());
        assert_eq!(buffer.write(b"x"), 0);
        assert_eq!(buffer.to_vec(), b"abcd");
    }

    #[test]
    fn test_read_when_empty() {
        let mut buffer = RingBuffer::new(4).unwrap();
        let mut out = [0u8; 4];
        assert_eq!(buffer.read(&mut out), 0);
        assert_eq!(buffer.peek(&mut out, 0), 0);
    }

    #[test]
    fn test_wraparound_write_and_read() {
        let mut buffer = RingBuffer::new(8).unwrap();
        assert_eq!(buffer.write(&[1, 2, 3, 4, 5, 6]), 6);

        let mut out = [0u8; 4];
        assert_eq!(buffer.read(&mut out), 4);
        assert_eq!(out, [1, 2, 3, 4]);
        assert_eq!(buffer.head, 4);

        assert_eq!(buffer.write(&[7, 8, 9, 10, 11, 12]), 6);
        assert!(buffer.is_full());
        assert_invariants(&buffer);

        let mut all = [0u8; 8];
        assert_eq!(buffer.read(&mut all), 8);
        assert_eq!(all, [5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_peek_with_offset_across_wrap() {
        let mut buffer = RingBuffer::new(8).unwrap();
        buffer.write(b"xxxxxx");
        buffer.discard(6);
        buffer.write(b"ABCDEF");

        let mut out = [0u8; 3];
        assert_eq!(buffer.peek(&mut out, 1), 3);
        assert_eq!(&out, b"BCD");

        let mut tail = [0u8; 8];
        assert_eq!(buffer.peek(&mut tail, 4), 2);
        assert_eq!(&tail[..2], b"EF");
    }

    #[test]
    fn test_peek_out_of_range_offset() {
        let mut buffer = RingBuffer::new(8).unwrap();
        buffer.write(b"abc");
        let mut out = [0u8; 4];
        assert_eq!(buffer.peek(&mut out, 3), 0);
        assert_eq!(buffer.peek(&mut out, 100), 0);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut buffer = RingBuffer::new(8).unwrap();
        buffer.write(b"abcdef");
        buffer.discard(3);
        buffer.write(b"ghij");

        let (head, tail, used) = (buffer.head, buffer.tail, buffer.used);
        let mut first = [0u8; 7];
        let mut second = [0u8; 7];
        assert_eq!(buffer.peek(&mut first, 0), 7);
        assert_eq!(buffer.peek(&mut second, 0), 7);
        assert_eq!(first, second);
        assert_eq!(&first, b"defghij");
        assert_eq!((buffer.head, buffer.tail, buffer.used), (head, tail, used));
    }

    #[test]
    fn test_search_across_wrap() {
        let mut buffer = RingBuffer::new(8).unwrap();
        buffer.write(b"zzzzz");
        buffer.discard(5);
        buffer.write(b"ABCDEF");
        // "ABC" sits at physical 5..8, "DEF" at 0..3
        assert_eq!(buffer.head, 5);

        assert_eq!(buffer.search(b"CDE"), Some(2));
        assert_eq!(buffer.search(b"ABCDEF"), Some(0));
        assert_eq!(buffer.search(b"F"), Some(5));
        assert_eq!(buffer.search(b"FA"), None);
        assert_eq!(buffer.search(b"ABCDEFG"), None);
        assert_eq!(buffer.search(b""), Some(0));
    }

    #[test]
    fn test_search_first_match_wins() {
        let mut buffer = RingBuffer::new(16).unwrap();
        buffer.write(b"abab\r\nabab");
        assert_eq!(buffer.search(b"ab"), Some(0));
        assert_eq!(buffer.search(b"\r\n"), Some(4));
        assert_eq!(buffer.search(b"ba"), Some(1));
    }

    #[test]
    fn test_empty_pattern_on_empty_buffer() {
        let buffer = RingBuffer::new(4).unwrap();
        assert_eq!(buffer.search(b""), Some(0));
        assert_eq!(buffer.search(b"a"), None);
    }

    #[test]
    fn test_clear_keeps_storage() {
        let mut buffer = RingBuffer::new(4).unwrap();
        buffer.write(b"abcd");
        buffer.clear();
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.free_space(), 4);
        assert_eq!(&buffer.storage[..], b"abcd");

        let mut empty = RingBuffer::new(4).unwrap();
        empty.clear();
        assert_eq!(empty.free_space(), 4);
    }

    #[test]
    fn test_get_and_iter() {
        let mut buffer = RingBuffer::new(4).unwrap();
        buffer.write(b"abc");
        buffer.discard(2);
        buffer.write(b"de");
        assert_eq!(buffer.get(0), Some(b'c'));
        assert_eq!(buffer.get(2), Some(b'e'));
        assert_eq!(buffer.get(3), None);
        assert_eq!(buffer.iter().collect::<Vec<_>>(), b"cde");
    }

    #[test]
    fn test_debug_output() {
        let mut buffer = RingBuffer::new(64).unwrap();
        buffer.write(&[0xAB, 0x01]);
        assert_eq!(
            format!("{:?}", buffer),
            "[cap=64 size=2 head=0 tail=2] data: AB 01"
        );

        buffer.write(&[0u8; 40]);
        assert!(format!("{:?}", buffer).ends_with(" ..."));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Write(Vec<u8>),
        Read(usize),
        Peek(usize, usize),
        Clear,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => proptest::collection::vec(any::<u8>(), 0..24).prop_map(Op::Write),
            3 => (0usize..24).prop_map(Op::Read),
            2 => (0usize..24, 0usize..24).prop_map(|(n, o)| Op::Peek(n, o)),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn prop_matches_deque_model(
            capacity in 1usize..20,
            ops in proptest::collection::vec(op_strategy(), 0..64),
        ) {
            let mut buffer = RingBuffer::new(capacity).unwrap();
            let mut model: VecDeque<u8> = VecDeque::new();

            for op in ops {
                match op {
                    Op::Write(data) => {
                        let written = buffer.write(&data);
                        let expected = data.len().min(capacity - model.len());
                        prop_assert_eq!(written, expected);
                        model.extend(&data[..written]);
                    }
                    Op::Read(n) => {
                        let mut out = vec![0u8; n];
                        let got = buffer.read(&mut out);
                        let expected: Vec<u8> = model.drain(..n.min(model.len())).collect();
                        prop_assert_eq!(&out[..got], &expected[..]);
                    }
                    Op::Peek(n, offset) => {
                        let mut out = vec![0u8; n];
                        let got = buffer.peek(&mut out, offset);
                        let expected: Vec<u8> =
                            model.iter().skip(offset).take(n).copied().collect();
                        prop_assert_eq!(&out[..got], &expected[..]);
                    }
                    Op::Clear => {
                        buffer.clear();
                        model.clear();
                    }
                }
                assert_invariants(&buffer);
                prop_assert_eq!(buffer.len(), model.len());
            }
        }

        #[test]
        fn prop_round_trip(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut buffer = RingBuffer::new(64).unwrap();
            prop_assert_eq!(buffer.write(&data), data.len());
            let mut out = vec![0u8; data.len()];
            prop_assert_eq!(buffer.read(&mut out), data.len());
            prop_assert_eq!(out, data);
        }

        #[test]
        fn prop_search_agrees_with_slice_search(
            skip in 0usize..12,
            data in proptest::collection::vec(0u8..3, 0..12),
            pattern in proptest::collection::vec(0u8..3, 1..4),
        ) {
            let mut buffer = RingBuffer::new(12).unwrap();
            buffer.write(&vec![9u8; skip]);
            buffer.discard(skip);
            buffer.write(&data);

            let expected = data.windows(pattern.len()).position(|w| w == &pattern[..]);
            prop_assert_eq!(buffer.search(&pattern), expected);
        }
    }
}
