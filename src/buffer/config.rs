//! Buffer configuration

/// Smallest capacity the normal construction path will accept
pub const MIN_CAPACITY: usize = 512;

/// Largest capacity the normal construction path will accept
pub const MAX_CAPACITY: usize = 1_048_576;

/// Default capacity when none is requested
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Maximum number of read clients a buffer can hold
pub const MAX_CLIENTS: usize = 8;

/// Configuration for a [`CircularSlotBuffer`](super::CircularSlotBuffer)
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Requested capacity in slots
    pub capacity: usize,

    /// Bypass capacity clamping (intended for tests)
    pub force: bool,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            force: false,
        }
    }
}

impl BufferConfig {
    /// Create a config with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Set the requested capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Bypass capacity clamping
    ///
    /// A forced capacity is used as given, outside the
    /// `[MIN_CAPACITY, MAX_CAPACITY]` range. Intended for tests that need
    /// a tiny buffer to provoke admission failures.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// The capacity the buffer will actually be built with
    pub fn effective_capacity(&self) -> usize {
        if self.force {
            self.capacity
        } else {
            self.capacity.clamp(MIN_CAPACITY, MAX_CAPACITY)
        }
    }
}
