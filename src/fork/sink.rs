//! Sink bookkeeping
//!
//! Pairs a registered buffer client with its destination and a running byte
//! counter. Used only by the forking reader.

use std::io::Write;

use crate::buffer::ClientId;

/// One attached sink: its read cursor, destination, and forwarded-byte count
pub(crate) struct SinkBinding {
    /// Buffer client id owned by this sink
    pub(crate) client: ClientId,

    /// Where drained bytes go
    dest: Box<dyn Write + Send>,

    /// Total bytes forwarded to the destination
    bytes_forwarded: u64,
}

impl SinkBinding {
    pub(crate) fn new(client: ClientId, dest: Box<dyn Write + Send>) -> Self {
        Self {
            client,
            dest,
            bytes_forwarded: 0,
        }
    }

    /// Forward one batch of drained bytes to the destination
    pub(crate) fn forward(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.dest.write_all(bytes)?;
        self.bytes_forwarded += bytes.len() as u64;
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> std::io::Result<()> {
        self.dest.flush()
    }

    pub(crate) fn bytes_forwarded(&self) -> u64 {
        self.bytes_forwarded
    }
}

impl std::fmt::Debug for SinkBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkBinding")
            .field("client", &self.client)
            .field("bytes_forwarded", &self.bytes_forwarded)
            .finish_non_exhaustive()
    }
}
