//! Stream-forking reader
//!
//! Wraps a source byte stream so that everything the caller reads is also
//! replicated, in order, to every attached sink. Replication goes through a
//! shared [`CircularSlotBuffer`]: the reader owns the primary read cursor,
//! each sink owns its own, and the slowest cursor bounds how far production
//! can run ahead.
//!
//! ```text
//!                 ForkingReader
//!             ┌───────────────────────────┐
//!   source ──►│ pull ──► CircularSlotBuffer │──► primary cursor ──► caller
//!             │              │    │        │
//!             │              ▼    ▼        │
//!             │        sink cursor(s)      │
//!             └──────────────│─────────────┘
//!                            ▼  (drained under pressure,
//!                        sink(s)  at end of stream, on close)
//! ```
//!
//! Sinks are drained lazily. The only relief when a lagging sink blocks
//! admission is one forced drain of every sink followed by a single write
//! retry; there is no waiting, polling, or per-sink tolerance. A sink that
//! hangs or fails takes the whole pipeline with it.

use std::io::{self, Read, Write};

use bytes::{BufMut, BytesMut};

use crate::buffer::{BufferConfig, CircularSlotBuffer, ClientId, StreamItem, MAX_CLIENTS};
use crate::error::ForkError;
use crate::stats::ForkStats;

use super::sink::SinkBinding;

/// Reader that replicates a source stream into attached sinks
///
/// Exposes the same byte-stream contract as the source: the [`Read`] impl,
/// plus [`skip`](Self::skip), [`available`](Self::available) and
/// [`close`](Self::close).
pub struct ForkingReader<R> {
    /// The real source stream
    source: R,

    /// Shared slot buffer between the reader and its sinks
    buffer: CircularSlotBuffer<StreamItem>,

    /// The reader's own (primary) cursor
    client: ClientId,

    /// Attached sinks, in registration order
    sinks: Vec<SinkBinding>,

    /// Data bytes returned to the caller (the end marker is not counted)
    bytes_read: u64,
}

impl<R> ForkingReader<R> {
    /// Wrap a source with the default buffer capacity
    pub fn new(source: R) -> Self {
        Self::with_config(source, BufferConfig::default())
    }

    /// Wrap a source with an explicit buffer config
    ///
    /// The config's `force` flag bypasses capacity clamping and is intended
    /// for tests.
    pub fn with_config(source: R, config: BufferConfig) -> Self {
        let buffer = CircularSlotBuffer::new(config);
        let client = buffer
            .register_client()
            .expect("fresh buffer has a free client slot");

        Self {
            source,
            buffer,
            client,
            sinks: Vec::new(),
            bytes_read: 0,
        }
    }

    /// Attach a sink that will receive a copy of every byte read from here on
    ///
    /// Returns false once the buffer's client ids are exhausted; the reader
    /// itself occupies one of the [`MAX_CLIENTS`] slots, leaving room for
    /// seven sinks.
    ///
    /// A sink attached after reading has started receives a replay of the
    /// most recently produced byte as its first element, and nothing earlier.
    pub fn add_sink(&mut self, sink: impl Write + Send + 'static) -> bool {
        match self.buffer.register_client() {
            Some(client) => {
                tracing::debug!(client = %client, sinks = self.sinks.len() + 1, "sink attached");
                self.sinks.push(SinkBinding::new(client, Box::new(sink)));
                true
            }
            None => {
                tracing::warn!(
                    max_forks = MAX_CLIENTS - 1,
                    "sink rejected, no client ids left"
                );
                false
            }
        }
    }

    /// Best-effort estimate of immediately retrievable bytes
    ///
    /// Derived from the primary cursor's buffer backlog; advisory only.
    pub fn available(&self) -> usize {
        self.buffer.available(self.client)
    }

    /// Number of attached sinks
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Data bytes returned to the caller so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Snapshot of the reader's byte counters
    pub fn stats(&self) -> ForkStats {
        ForkStats {
            bytes_read: self.bytes_read,
            bytes_forwarded: self.sinks.iter().map(|s| s.bytes_forwarded()).collect(),
        }
    }

    /// Drain remaining buffered data to every sink, then flush and release
    /// the sinks in registration order
    ///
    /// A second call is a clean no-op: the sinks are gone after the first.
    pub fn close(&mut self) -> io::Result<()> {
        self.drain_all_sinks()?;

        let mut total = 0u64;
        for mut binding in self.sinks.drain(..) {
            binding.flush()?;
            total += binding.bytes_forwarded();
            tracing::debug!(
                client = %binding.client,
                bytes = binding.bytes_forwarded(),
                "sink closed"
            );
        }

        tracing::debug!(
            bytes_read = self.bytes_read,
            bytes_forwarded = total,
            "forking reader closed"
        );
        Ok(())
    }

    /// Forward everything pending for every sink, in cursor order
    fn drain_all_sinks(&mut self) -> io::Result<()> {
        for binding in &mut self.sinks {
            drain_sink(&self.buffer, binding)?;
        }
        Ok(())
    }
}

impl<R: Read> ForkingReader<R> {
    /// Read the next unit of the stream
    ///
    /// Produces either one data byte or the end-of-stream marker. On the end
    /// marker every sink receives its trailing buffered data; the marker
    /// itself is never forwarded as a byte and is not counted as one.
    pub fn read_item(&mut self) -> io::Result<StreamItem> {
        // A previous drain may already have produced data for this cursor
        if let Some(item) = self.buffer.read(self.client) {
            return self.finish(item);
        }

        let item = self.pull_source()?;

        if !self.buffer.write(item) {
            // Some sink lags by a full buffer. Forced catch-up of every sink
            // is the only relief; it frees at least one slot, so a second
            // rejection means the admission invariant is broken.
            self.drain_all_sinks()?;
            if !self.buffer.write(item) {
                let err = ForkError::CapacityExhausted {
                    capacity: self.buffer.capacity(),
                };
                tracing::error!(capacity = self.buffer.capacity(), "{}", err);
                return Err(err.into());
            }
        }

        let item = self
            .buffer
            .read(self.client)
            .expect("own cursor reaches the element just written");
        self.finish(item)
    }

    /// Skip up to `n` bytes via the source's own skip path
    ///
    /// Skipped bytes bypass the buffer entirely: they are never seen by the
    /// caller and never reach any sink.
    pub fn skip(&mut self, n: u64) -> io::Result<u64> {
        io::copy(&mut (&mut self.source).take(n), &mut io::sink())
    }

    fn finish(&mut self, item: StreamItem) -> io::Result<StreamItem> {
        match item {
            StreamItem::End => self.drain_all_sinks()?,
            StreamItem::Byte(_) => self.bytes_read += 1,
        }
        Ok(item)
    }

    /// Pull one unit from the real source
    fn pull_source(&mut self) -> io::Result<StreamItem> {
        let mut byte = [0u8; 1];
        loop {
            match self.source.read(&mut byte) {
                Ok(0) => return Ok(StreamItem::End),
                Ok(_) => return Ok(StreamItem::Byte(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: Read> Read for ForkingReader<R> {
    /// Equivalent to repeated single-unit reads: every byte placed into
    /// `buf` has reached the buffer (and therefore every registered sink's
    /// backlog) in order, and the end marker still triggers the final drain.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_item()? {
                StreamItem::Byte(b) => {
                    buf[filled] = b;
                    filled += 1;
                }
                StreamItem::End => break,
            }
        }
        Ok(filled)
    }
}

impl<R> Drop for ForkingReader<R> {
    fn drop(&mut self) {
        if self.sinks.is_empty() {
            return;
        }
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "close during drop failed");
        }
    }
}

/// Forward every element pending for one sink, batched into a single write
fn drain_sink(
    buffer: &CircularSlotBuffer<StreamItem>,
    binding: &mut SinkBinding,
) -> io::Result<()> {
    let mut batch = BytesMut::new();
    while let Some(item) = buffer.read(binding.client) {
        if let StreamItem::Byte(b) = item {
            batch.put_u8(b);
        }
    }

    if !batch.is_empty() {
        binding.forward(&batch)?;
    }
    Ok(())
}
