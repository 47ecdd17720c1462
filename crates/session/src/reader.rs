//! Transport reader loop (producer)

use crate::link::LinkSlot;
use crate::log_sink::SharedLog;
use crate::stats::SessionCounters;
use crate::Step;
use ring_buffer::SharedRingBuffer;
use serial_link::{ReadOutcome, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Drains the serial link into the ring buffer until its run flag clears.
///
/// Reads never block longer than the transport timeout and ingestion never
/// blocks at all: when the buffer is full the oldest bytes are evicted.
pub struct TransportReader {
    link: LinkSlot,
    buffer: SharedRingBuffer,
    counters: Arc<SessionCounters>,
    log: SharedLog,
    running: Arc<AtomicBool>,
    chunk: Vec<u8>,
    idle_closed: Duration,
    idle_error: Duration,
    /// Consecutive failed reads; only the first of a streak is logged
    error_streak: u64,
}

impl TransportReader {
    pub fn new(
        link: LinkSlot,
        buffer: SharedRingBuffer,
        counters: Arc<SessionCounters>,
        log: SharedLog,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            link,
            buffer,
            counters,
            log,
            running,
            chunk: vec![0u8; 4096],
            idle_closed: Duration::from_millis(100),
            idle_error: Duration::from_millis(10),
            error_streak: 0,
        }
    }

    /// Largest single transport read
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk = vec![0u8; size.max(1)];
        self
    }

    /// Sleep intervals while no port is open and after a failed read
    pub fn with_idle(mut self, closed: Duration, error: Duration) -> Self {
        self.idle_closed = closed;
        self.idle_error = error;
        self
    }

    /// Run on the current thread until the run flag clears
    pub fn run(mut self) {
        info!("Transport reader started");
        while self.running.load(Ordering::Acquire) {
            if let Step::Idle(pause) = self.step() {
                thread::sleep(pause);
            }
        }
        info!("Transport reader stopped");
    }

    /// One iteration: a single bounded read, then ingest
    pub fn step(&mut self) -> Step {
        match self.link.read(&mut self.chunk) {
            Ok(ReadOutcome::Data(n)) => {
                self.recovered();
                self.ingest(n);
                Step::Continue
            }
            Ok(ReadOutcome::Timeout) => {
                self.recovered();
                Step::Continue
            }
            Err(TransportError::NotOpen) => Step::Idle(self.idle_closed),
            Err(e) => {
                self.counters.add_transport_error();
                if self.error_streak == 0 {
                    warn!("Serial read failed, retrying: {}", e);
                }
                self.error_streak += 1;
                Step::Idle(self.idle_error)
            }
        }
    }

    fn ingest(&mut self, n: usize) {
        let data = &self.chunk[..n];
        let outcome = self.buffer.ingest(data);
        self.counters.add_received(n);
        if outcome.dropped > 0 {
            self.counters.add_dropped(outcome.dropped);
            debug!("Buffer full, evicted {} oldest bytes", outcome.dropped);
        }
        self.log.mirror(data);
    }

    fn recovered(&mut self) {
        if self.error_streak > 0 {
            info!("Serial reads recovered after {} failures", self.error_streak);
            self.error_streak = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_link::{Connector, LinkSettings, MockConnector, MockPeer};

    fn fixture(capacity: usize) -> (TransportReader, MockPeer, SharedRingBuffer, Arc<SessionCounters>) {
        let (connector, peer) = MockConnector::new();
        let link = LinkSlot::new();
        let settings = LinkSettings {
            read_timeout: Duration::from_millis(5),
            ..Default::default()
        };
        link.install(connector.open("mock0", &settings).unwrap())
            .unwrap();

        let buffer = SharedRingBuffer::new(capacity).unwrap();
        let counters = Arc::new(SessionCounters::new());
        let reader = TransportReader::new(
            link,
            buffer.clone(),
            counters.clone(),
            SharedLog::new(),
            Arc::new(AtomicBool::new(true)),
        );
        (reader, peer, buffer, counters)
    }

    #[test]
    fn test_step_ingests_data() {
        let (mut reader, peer, buffer, counters) = fixture(16);
        peer.inject(b"hello");
        assert_eq!(reader.step(), Step::Continue);
        assert_eq!(buffer.dump(16), b"hello");
        assert_eq!(counters.received(), 5);
    }

    #[test]
    fn test_timeout_continues_without_idle() {
        let (mut reader, _peer, buffer, _) = fixture(16);
        assert_eq!(reader.step(), Step::Continue);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_closed_link_idles() {
        let (mut reader, _peer, _, counters) = fixture(16);
        reader.link.close();
        assert_eq!(reader.step(), Step::Idle(Duration::from_millis(100)));
        assert_eq!(counters.transport_errors(), 0);
    }

    #[test]
    fn test_read_error_is_counted_and_retried() {
        let (mut reader, peer, buffer, counters) = fixture(16);
        peer.fail_reads(2);
        assert_eq!(reader.step(), Step::Idle(Duration::from_millis(10)));
        assert_eq!(reader.step(), Step::Idle(Duration::from_millis(10)));
        assert_eq!(counters.transport_errors(), 2);

        peer.inject(b"ok");
        assert_eq!(reader.step(), Step::Continue);
        assert_eq!(buffer.dump(4), b"ok");
        assert_eq!(reader.error_streak, 0);
    }

    #[test]
    fn test_overflow_counts_dropped() {
        let (reader, peer, buffer, counters) = fixture(4);
        let mut reader = reader.with_chunk_size(3);
        peer.inject(b"abcdefg");
        while peer.pending() > 0 {
            reader.step();
        }
        assert_eq!(buffer.dump(4), b"defg");
        assert_eq!(counters.received(), 7);
        assert_eq!(counters.dropped(), 3);
    }

    #[test]
    fn test_run_exits_when_flag_clears() {
        let (reader, _peer, _, _) = fixture(16);
        let running = reader.running.clone();
        let handle = thread::spawn(move || reader.run());
        thread::sleep(Duration::from_millis(20));
        running.store(false, Ordering::Release);
        handle.join().unwrap();
    }
}
