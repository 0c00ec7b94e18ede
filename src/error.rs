//! Pipeline error types
//!
//! I/O failures from the source or a sink are propagated as plain
//! `std::io::Error` without wrapping. This module covers the one failure the
//! pipeline itself can produce.

/// Error type for the forking pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForkError {
    /// A buffer write was rejected even after every sink was force-drained.
    ///
    /// A successful drain frees at least one slot, so this indicates a
    /// broken admission invariant rather than a recoverable condition.
    CapacityExhausted {
        /// Capacity of the buffer that rejected the write
        capacity: usize,
    },
}

impl std::fmt::Display for ForkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForkError::CapacityExhausted { capacity } => {
                write!(
                    f,
                    "buffer of capacity {} rejected a write after a full drain",
                    capacity
                )
            }
        }
    }
}

impl std::error::Error for ForkError {}

impl From<ForkError> for std::io::Error {
    fn from(e: ForkError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, e)
    }
}
