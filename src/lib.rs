//! Stream forking over a bounded multi-reader buffer
//!
//! One source byte stream is consumed normally by a primary reader while
//! being replicated, without full in-memory buffering, to up to seven
//! independent sinks that may lag the primary by a bounded amount.
//!
//! # Architecture
//!
//! ```text
//!                       ForkingReader<R>
//!                 ┌──────────────────────────┐
//!     R: Read ───►│ CircularSlotBuffer<StreamItem>
//!                 │   write cursor W         │───► primary cursor ──► caller
//!                 │   read cursors R0..R7    │
//!                 └────────────│─────────────┘
//!                    ┌─────────┼─────────┐
//!                    ▼         ▼         ▼
//!                 sink 0    sink 1    sink N      (drained lazily)
//! ```
//!
//! The slowest cursor bounds how far the writer may run ahead; when a lagging
//! sink blocks admission, every sink is force-drained once and the write is
//! retried once. There is no waiting and no per-sink tolerance: a sink that
//! hangs or fails takes the pipeline with it.
//!
//! # Example
//!
//! ```
//! use std::io::{Cursor, Read};
//! use forkstream::ForkingReader;
//!
//! let mut reader = ForkingReader::new(Cursor::new(b"hello".to_vec()));
//! reader.add_sink(Vec::<u8>::new());
//!
//! let mut out = String::new();
//! reader.read_to_string(&mut out).unwrap();
//! assert_eq!(out, "hello");
//! reader.close().unwrap();
//! ```
//!
//! Diagnostics go through the `tracing` facade; install a subscriber to see
//! per-sink and total byte counts at debug verbosity.

pub mod buffer;
pub mod error;
pub mod fork;
pub mod stats;

pub use buffer::{BufferConfig, CircularSlotBuffer, ClientId, StreamItem};
pub use error::ForkError;
pub use fork::ForkingReader;
pub use stats::ForkStats;
