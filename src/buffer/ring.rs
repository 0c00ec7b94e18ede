//! Bounded multi-reader circular buffer
//!
//! One logical writer and up to [`MAX_CLIENTS`] readers share a fixed slot
//! array. The write cursor and the per-client read cursors are monotonically
//! increasing logical indices; the physical slot for a logical index is
//! `index % capacity`. A slot may be overwritten once every registered client
//! has read past it, which makes the slowest client the bound on how far the
//! writer can run ahead.
//!
//! `write` and `read` each take the buffer's single critical section.
//! `available` deliberately does not: it is an advisory estimate computed
//! from the cursors alone and may undercount under concurrent access, never
//! overcount.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::config::{BufferConfig, MAX_CLIENTS};

/// Handle for one registered read cursor
///
/// Obtained from [`CircularSlotBuffer::register_client`] and only meaningful
/// for the buffer that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(usize);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bounded ring buffer with one write cursor and independent read cursors
#[derive(Debug)]
pub struct CircularSlotBuffer<E> {
    /// Slot array; guarded by the buffer's one critical section
    slots: Mutex<Box<[Option<E>]>>,

    /// Slot count
    capacity: usize,

    /// Logical index of the most recently written element, -1 before any write
    write_cursor: AtomicI64,

    /// Next unread logical index per client; only the first `client_count`
    /// entries are live. Mutated only while the slot lock is held.
    cursors: [AtomicI64; MAX_CLIENTS],

    /// Number of registered clients
    client_count: AtomicUsize,
}

impl<E> CircularSlotBuffer<E> {
    /// Create a buffer from a config
    ///
    /// The requested capacity is clamped into `[MIN_CAPACITY, MAX_CAPACITY]`
    /// unless the config's `force` flag is set.
    ///
    /// # Panics
    ///
    /// Panics if the effective capacity is zero.
    pub fn new(config: BufferConfig) -> Self {
        let capacity = config.effective_capacity();
        assert!(capacity >= 1, "capacity must be at least 1");

        let slots = (0..capacity)
            .map(|_| None)
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            slots: Mutex::new(slots),
            capacity,
            write_cursor: AtomicI64::new(-1),
            cursors: std::array::from_fn(|_| AtomicI64::new(0)),
            client_count: AtomicUsize::new(0),
        }
    }

    /// Register a new read cursor
    ///
    /// Returns `None` once [`MAX_CLIENTS`] cursors have been handed out.
    ///
    /// A client registered after writes have begun starts at the current
    /// write cursor, so its first read replays the most recently written
    /// element rather than waiting for the next one.
    pub fn register_client(&self) -> Option<ClientId> {
        let _slots = self.slots.lock().unwrap();

        let count = self.client_count.load(Ordering::Relaxed);
        if count == MAX_CLIENTS {
            return None;
        }

        let start = self.write_cursor.load(Ordering::Relaxed).max(0);
        self.cursors[count].store(start, Ordering::Release);
        self.client_count.store(count + 1, Ordering::Release);

        Some(ClientId(count))
    }

    /// Admit one element
    ///
    /// Returns false without mutating anything if storing the element would
    /// overwrite a slot some client has not read yet. The admission check and
    /// the store happen under the same critical section, so a concurrent
    /// writer cannot race past the check.
    pub fn write(&self, element: E) -> bool {
        let mut slots = self.slots.lock().unwrap();

        let w = self.write_cursor.load(Ordering::Relaxed);
        if (w - self.min_cursor(w)) + 1 >= self.capacity as i64 {
            return false;
        }

        let next = w + 1;
        slots[next as usize % self.capacity] = Some(element);
        self.write_cursor.store(next, Ordering::Release);
        true
    }

    /// Read the next element for a client
    ///
    /// Returns `None` while nothing is pending for that cursor. The result
    /// is distinct from whatever in-band markers `E` carries: an element is
    /// always returned exactly as written.
    ///
    /// # Panics
    ///
    /// Panics if `client` was not issued by this buffer.
    pub fn read(&self, client: ClientId) -> Option<E>
    where
        E: Clone,
    {
        let slots = self.slots.lock().unwrap();
        self.assert_registered(client);

        let r = self.cursors[client.0].load(Ordering::Relaxed);
        let w = self.write_cursor.load(Ordering::Relaxed);
        if r > w {
            return None;
        }

        let element = slots[r as usize % self.capacity]
            .clone()
            .expect("slot behind the write cursor holds an element");
        self.cursors[client.0].store(r + 1, Ordering::Release);

        Some(element)
    }

    /// Advisory backlog estimate for a client
    ///
    /// Computed outside the critical section. The write cursor is loaded
    /// before the client cursor; concurrent progress on either side can only
    /// shrink the true backlog relative to what was sampled, so the estimate
    /// never overcounts.
    ///
    /// # Panics
    ///
    /// Panics if `client` was not issued by this buffer.
    pub fn available(&self, client: ClientId) -> usize {
        self.assert_registered(client);

        let w = self.write_cursor.load(Ordering::Acquire);
        let r = self.cursors[client.0].load(Ordering::Acquire);
        (w - r + 1).max(0) as usize
    }

    /// Slot count
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of registered clients
    pub fn client_count(&self) -> usize {
        self.client_count.load(Ordering::Acquire)
    }

    /// Minimum cursor over registered clients, or `w + 1` when none are
    /// registered (nothing can be unread). Caller must hold the slot lock.
    fn min_cursor(&self, w: i64) -> i64 {
        let count = self.client_count.load(Ordering::Relaxed);
        (0..count)
            .map(|i| self.cursors[i].load(Ordering::Relaxed))
            .min()
            .unwrap_or(w + 1)
    }

    fn assert_registered(&self, client: ClientId) {
        let count = self.client_count.load(Ordering::Acquire);
        assert!(
            client.0 < count,
            "client {} is not registered with this buffer",
            client.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::config::{DEFAULT_CAPACITY, MAX_CAPACITY, MIN_CAPACITY};
    use crate::buffer::slot::StreamItem;

    fn tiny(capacity: usize) -> CircularSlotBuffer<u8> {
        CircularSlotBuffer::new(BufferConfig::with_capacity(capacity).force(true))
    }

    #[test]
    fn test_capacity_from_config() {
        let buffer: CircularSlotBuffer<u8> = CircularSlotBuffer::new(BufferConfig::default());
        assert_eq!(buffer.capacity(), DEFAULT_CAPACITY);

        let clamped: CircularSlotBuffer<u8> =
            CircularSlotBuffer::new(BufferConfig::with_capacity(1));
        assert_eq!(clamped.capacity(), MIN_CAPACITY);

        let clamped: CircularSlotBuffer<u8> =
            CircularSlotBuffer::new(BufferConfig::with_capacity(usize::MAX));
        assert_eq!(clamped.capacity(), MAX_CAPACITY);
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn test_zero_capacity_rejected() {
        let _ = tiny(0);
    }

    #[test]
    fn test_write_then_read_in_order() {
        let buffer = tiny(8);
        let client = buffer.register_client().unwrap();

        assert!(buffer.write(10));
        assert!(buffer.write(20));
        assert!(buffer.write(30));

        assert_eq!(buffer.read(client), Some(10));
        assert_eq!(buffer.read(client), Some(20));
        assert_eq!(buffer.read(client), Some(30));
        assert_eq!(buffer.read(client), None);
    }

    #[test]
    fn test_independent_cursors() {
        let buffer = tiny(8);
        let a = buffer.register_client().unwrap();
        let b = buffer.register_client().unwrap();

        buffer.write(1);
        buffer.write(2);

        assert_eq!(buffer.read(a), Some(1));
        assert_eq!(buffer.read(a), Some(2));

        // b's cursor is untouched by a's reads
        assert_eq!(buffer.read(b), Some(1));
        assert_eq!(buffer.read(b), Some(2));
    }

    #[test]
    fn test_admission_bound_by_slowest_client() {
        let buffer = tiny(4);
        let fast = buffer.register_client().unwrap();
        let slow = buffer.register_client().unwrap();

        // Four slots, four admitted writes
        for v in 0..4 {
            assert!(buffer.write(v), "write {} should be admitted", v);
        }
        assert!(!buffer.write(4));

        // Only the fast client reading does not help
        for _ in 0..4 {
            buffer.read(fast);
        }
        assert!(!buffer.write(4));

        // One slow read frees exactly one slot
        buffer.read(slow);
        assert!(buffer.write(4));
        assert!(!buffer.write(5));
    }

    #[test]
    fn test_minimum_capacity_alternation() {
        // Smallest forced capacity: one unread element fills the buffer
        let buffer = tiny(1);
        let a = buffer.register_client().unwrap();
        let b = buffer.register_client().unwrap();

        assert!(buffer.write(0xAB));

        assert_eq!(buffer.read(a), Some(0xAB));
        assert!(!buffer.write(0xCD), "b has not read yet");
        assert!(!buffer.write(0xCD));

        assert_eq!(buffer.read(b), Some(0xAB));
        assert!(buffer.write(0xCD), "both clients drained, slot is free");
    }

    #[test]
    fn test_wraparound_reuses_slots() {
        let buffer = tiny(2);
        let client = buffer.register_client().unwrap();

        for round in 0..10u8 {
            assert!(buffer.write(round));
            assert_eq!(buffer.read(client), Some(round));
        }
    }

    #[test]
    fn test_client_limit() {
        let buffer = tiny(8);

        for _ in 0..MAX_CLIENTS {
            assert!(buffer.register_client().is_some());
        }

        // The 9th registration reports no capacity instead of failing hard
        assert!(buffer.register_client().is_none());
        assert_eq!(buffer.client_count(), MAX_CLIENTS);
    }

    #[test]
    fn test_late_client_replays_most_recent_element() {
        let buffer = tiny(8);
        let first = buffer.register_client().unwrap();

        buffer.write(b'a');
        buffer.write(b'b');
        buffer.write(b'c');
        buffer.read(first);

        // Joins at the current write cursor: re-reads 'c', not 'a' or the
        // next future element
        let late = buffer.register_client().unwrap();
        assert_eq!(buffer.read(late), Some(b'c'));
        assert_eq!(buffer.read(late), None);

        buffer.write(b'd');
        assert_eq!(buffer.read(late), Some(b'd'));
    }

    #[test]
    fn test_client_registered_before_first_write_sees_everything() {
        let buffer = tiny(8);
        let client = buffer.register_client().unwrap();

        assert_eq!(buffer.read(client), None);

        buffer.write(b'x');
        assert_eq!(buffer.read(client), Some(b'x'));
    }

    #[test]
    fn test_available_tracks_backlog() {
        let buffer = tiny(8);
        let client = buffer.register_client().unwrap();

        assert_eq!(buffer.available(client), 0);

        buffer.write(1);
        buffer.write(2);
        buffer.write(3);
        assert_eq!(buffer.available(client), 3);

        buffer.read(client);
        assert_eq!(buffer.available(client), 2);

        buffer.read(client);
        buffer.read(client);

        // Zero exactly when read would report nothing pending
        assert_eq!(buffer.available(client), 0);
        assert_eq!(buffer.read(client), None);
    }

    #[test]
    fn test_available_per_client() {
        let buffer = tiny(8);
        let a = buffer.register_client().unwrap();
        let b = buffer.register_client().unwrap();

        buffer.write(1);
        buffer.write(2);
        buffer.read(a);

        assert_eq!(buffer.available(a), 1);
        assert_eq!(buffer.available(b), 2);
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn test_unknown_client_fails_loudly() {
        let issuing = tiny(8);
        let _ = issuing.register_client().unwrap();
        let foreign = issuing.register_client().unwrap();

        // A buffer that never issued this id rejects it
        let buffer = tiny(8);
        let _ = buffer.register_client().unwrap();
        let _ = buffer.read(foreign);
    }

    #[test]
    fn test_end_marker_distinct_from_nothing_pending() {
        let buffer: CircularSlotBuffer<StreamItem> =
            CircularSlotBuffer::new(BufferConfig::with_capacity(8).force(true));
        let client = buffer.register_client().unwrap();

        assert_eq!(buffer.read(client), None);

        buffer.write(StreamItem::End);
        assert_eq!(buffer.read(client), Some(StreamItem::End));
        assert_eq!(buffer.read(client), None);
    }

    #[test]
    fn test_writes_without_clients_always_admitted() {
        let buffer = tiny(2);

        for v in 0..100u8 {
            assert!(buffer.write(v));
        }
    }

    #[test]
    fn test_concurrent_reader_sees_writer_progress() {
        use std::sync::Arc;

        let buffer = Arc::new(tiny(512));
        let client = buffer.register_client().unwrap();

        let writer = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                for v in 0..200u8 {
                    while !buffer.write(v) {
                        std::thread::yield_now();
                    }
                }
            })
        };

        let mut seen = Vec::new();
        while seen.len() < 200 {
            match buffer.read(client) {
                Some(v) => seen.push(v),
                None => std::thread::yield_now(),
            }
        }
        writer.join().unwrap();

        let expected: Vec<u8> = (0..200).collect();
        assert_eq!(seen, expected);
    }
}
