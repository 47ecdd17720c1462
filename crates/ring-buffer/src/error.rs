//! Buffer Error Types

use thiserror::Error;

/// Errors raised while constructing a ring buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Capacity must be at least one byte
    #[error("Ring buffer capacity must be at least 1 byte")]
    InvalidCapacity,

    /// Backing storage could not be reserved
    #[error("Failed to allocate {capacity} bytes for ring buffer storage")]
    AllocationFailed { capacity: usize },
}
