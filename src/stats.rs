//! Byte counters for a forking pipeline

/// Snapshot of a reader's byte counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForkStats {
    /// Data bytes returned to the caller
    pub bytes_read: u64,

    /// Bytes forwarded to each sink, in registration order
    pub bytes_forwarded: Vec<u64>,
}

impl ForkStats {
    /// Number of sinks the snapshot covers
    pub fn sink_count(&self) -> usize {
        self.bytes_forwarded.len()
    }

    /// Total bytes forwarded across all sinks
    pub fn total_forwarded(&self) -> u64 {
        self.bytes_forwarded.iter().sum()
    }
}

impl std::fmt::Display for ForkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} bytes read, {} bytes forwarded across {} sink(s)",
            self.bytes_read,
            self.total_forwarded(),
            self.sink_count()
        )
    }
}
