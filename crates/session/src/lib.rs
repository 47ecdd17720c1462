//! Serial Terminal Session
//!
//! Owns one shared ring buffer and two worker threads: a reader that drains
//! the serial link into the buffer (evicting the oldest bytes when full) and
//! a live consumer that drains the buffer to the display. Administrative
//! calls (dump, search, clear, stats) run concurrently with both workers.

mod config;
mod consumer;
mod controller;
mod error;
mod link;
mod log_sink;
mod reader;
mod render;
mod stats;

pub use config::SessionConfig;
pub use consumer::LiveConsumer;
pub use controller::Session;
pub use error::SessionError;
pub use link::{LinkSlot, LinkStatus};
pub use log_sink::SharedLog;
pub use reader::TransportReader;
pub use render::{render, ViewMode, PLACEHOLDER};
pub use stats::{SessionCounters, SessionStats};

use std::time::Duration;

/// What a worker loop should do after one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Work was done or a read timed out; go again immediately
    Continue,
    /// Nothing to do; sleep before the next iteration
    Idle(Duration),
}
