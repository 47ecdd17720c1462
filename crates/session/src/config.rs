//! Session configuration

use crate::error::SessionError;
use crate::render::ViewMode;
use serde::{Deserialize, Serialize};
use serial_link::LinkSettings;
use std::time::Duration;

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Ring buffer capacity in bytes
    pub buffer_capacity: usize,

    /// Largest single transport read
    pub read_chunk: usize,

    /// Largest chunk the live display renders per iteration
    pub display_chunk: usize,

    /// Transport read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Reader sleep while no port is open (milliseconds)
    pub idle_closed_ms: u64,

    /// Reader sleep after a failed read (milliseconds)
    pub idle_error_ms: u64,

    /// Display sleep while paused (milliseconds)
    pub idle_paused_ms: u64,

    /// Display sleep while the buffer is empty (milliseconds)
    pub idle_empty_ms: u64,

    /// Enable RTS/CTS when opening a port
    pub flow_control: bool,

    /// Start with the live display running
    pub live: bool,

    /// Initial display mode
    pub view: ViewMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: ring_buffer::DEFAULT_CAPACITY,
            read_chunk: 4096,
            display_chunk: 4096,
            read_timeout_ms: 100,
            idle_closed_ms: 100,
            idle_error_ms: 10,
            idle_paused_ms: 50,
            idle_empty_ms: 20,
            flow_control: false,
            live: true,
            view: ViewMode::Ascii,
        }
    }
}

impl SessionConfig {
    /// Reject values the worker loops cannot run with
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.read_chunk == 0 {
            return Err(SessionError::InvalidConfig("read_chunk must be > 0".into()));
        }
        if self.display_chunk == 0 {
            return Err(SessionError::InvalidConfig("display_chunk must be > 0".into()));
        }
        if self.read_timeout_ms == 0 {
            return Err(SessionError::InvalidConfig("read_timeout_ms must be > 0".into()));
        }
        Ok(())
    }

    /// Line settings for opening a port at `baud_rate`
    pub fn link_settings(&self, baud_rate: u32) -> LinkSettings {
        LinkSettings {
            baud_rate,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            flow_control: self.flow_control,
        }
    }

    pub(crate) fn idle_closed(&self) -> Duration {
        Duration::from_millis(self.idle_closed_ms)
    }

    pub(crate) fn idle_error(&self) -> Duration {
        Duration::from_millis(self.idle_error_ms)
    }

    pub(crate) fn idle_paused(&self) -> Duration {
        Duration::from_millis(self.idle_paused_ms)
    }

    pub(crate) fn idle_empty(&self) -> Duration {
        Duration::from_millis(self.idle_empty_ms)
    }
}
