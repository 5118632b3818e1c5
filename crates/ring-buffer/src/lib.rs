//! Rolling Window Ring Buffer
//!
//! Provides the fixed-capacity rolling window a monitoring session keeps of
//! its most recent readings. Oldest entries are evicted on overflow, so the
//! window never grows past its configured capacity.

mod buffer;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};

use thiserror::Error;

/// Ring buffer errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RingBufferError {
    #[error("Ring buffer capacity must be greater than zero")]
    ZeroCapacity,
}
