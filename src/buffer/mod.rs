//! Bounded multi-reader buffering
//!
//! [`CircularSlotBuffer`] is the storage core of the crate: a fixed slot
//! array, one monotonic write cursor, and up to eight independent read
//! cursors. [`BufferConfig`] controls capacity (clamped by default, forced
//! for tests) and [`StreamItem`] is the element the byte pipeline stores.

pub mod config;
pub mod ring;
pub mod slot;

pub use config::{BufferConfig, DEFAULT_CAPACITY, MAX_CAPACITY, MAX_CLIENTS, MIN_CAPACITY};
pub use ring::{CircularSlotBuffer, ClientId};
pub use slot::StreamItem;
