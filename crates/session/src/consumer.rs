//! Live display loop (consumer)

use crate::render::{render, AtomicViewMode, ViewMode};
use crate::stats::SessionCounters;
use crate::Step;
use ring_buffer::SharedRingBuffer;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Display state the controller flips while the consumer runs
#[derive(Debug)]
pub(crate) struct DisplayControls {
    pub(crate) live: AtomicBool,
    pub(crate) view: AtomicViewMode,
}

impl DisplayControls {
    pub(crate) fn new(live: bool, view: ViewMode) -> Self {
        Self {
            live: AtomicBool::new(live),
            view: AtomicViewMode::new(view),
        }
    }
}

/// Drains the ring buffer to the display in bounded chunks.
///
/// While paused nothing is read, so bytes keep accumulating in the buffer
/// (and are eventually evicted by the reader if it fills).
pub struct LiveConsumer {
    buffer: SharedRingBuffer,
    counters: Arc<SessionCounters>,
    controls: Arc<DisplayControls>,
    running: Arc<AtomicBool>,
    output: Box<dyn Write + Send>,
    chunk: Vec<u8>,
    idle_paused: Duration,
    idle_empty: Duration,
    output_failed: bool,
}

impl LiveConsumer {
    pub(crate) fn new(
        buffer: SharedRingBuffer,
        counters: Arc<SessionCounters>,
        controls: Arc<DisplayControls>,
        running: Arc<AtomicBool>,
        output: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            buffer,
            counters,
            controls,
            running,
            output,
            chunk: vec![0u8; 4096],
            idle_paused: Duration::from_millis(50),
            idle_empty: Duration::from_millis(20),
            output_failed: false,
        }
    }

    /// Largest chunk rendered per iteration
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk = vec![0u8; size.max(1)];
        self
    }

    /// Sleep intervals while paused and while the buffer is empty
    pub fn with_idle(mut self, paused: Duration, empty: Duration) -> Self {
        self.idle_paused = paused;
        self.idle_empty = empty;
        self
    }

    /// Run on the current thread until the run flag clears
    pub fn run(mut self) {
        info!("Live display started");
        while self.running.load(Ordering::Acquire) {
            if let Step::Idle(pause) = self.step() {
                thread::sleep(pause);
            }
        }
        let _ = self.output.flush();
        info!("Live display stopped");
    }

    /// One iteration: read one chunk and render it
    pub fn step(&mut self) -> Step {
        if !self.controls.live.load(Ordering::Relaxed) {
            return Step::Idle(self.idle_paused);
        }

        let n = self.buffer.read(&mut self.chunk);
        if n == 0 {
            return Step::Idle(self.idle_empty);
        }

        let text = render(&self.chunk[..n], self.controls.view.load());
        self.counters.add_consumed(n);
        self.show(text.as_bytes());
        Step::Continue
    }

    fn show(&mut self, text: &[u8]) {
        let result = self
            .output
            .write_all(text)
            .and_then(|()| self.output.flush());
        match result {
            Ok(()) => self.output_failed = false,
            Err(e) if !self.output_failed => {
                warn!("Display write failed: {}", e);
                self.output_failed = true;
            }
            Err(_) => {}
        }
    }
}
