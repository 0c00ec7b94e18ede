//! Stream forking
//!
//! [`ForkingReader`] drives the whole pipeline: it pulls from the source,
//! admits elements into the shared buffer, and drains attached sinks when
//! pressure, end of stream, or close demands it.

pub mod reader;
mod sink;

pub use reader::ForkingReader;
