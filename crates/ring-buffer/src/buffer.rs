//! Lock-Free Ring Buffer Implementation

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Lock-free SPSC ring buffer for bytes
///
/// One slot is always left unused so that `read == write` unambiguously means
/// empty: a buffer of length `N` queues at most `N - 1` bytes.
pub struct RingBuffer<const N: usize> {
    /// Pre-allocated storage
    storage: UnsafeCell<[u8; N]>,
    /// Read position, stored only by the consumer
    read: AtomicUsize,
    /// Write position, stored only by the producer
    write: AtomicUsize,
    /// Bytes accepted (producer-owned counter)
    pushed: AtomicUsize,
    /// Bytes dropped because the buffer was full (producer-owned counter)
    dropped: AtomicUsize,
}

// SAFETY: a slot is only written by the producer while it lies outside the
// `read..write` window and only read by the consumer while inside it. The
// cursor stores use Release and the opposite side loads them with Acquire, so
// the byte is visible before the cursor that publishes it.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    /// Create an empty buffer; usable in `static` initializers
    pub const fn new() -> Self {
        assert!(N > 1, "ring buffer needs at least two slots");
        Self {
            storage: UnsafeCell::new([0; N]),
            read: AtomicUsize::new(0),
            write: AtomicUsize::new(0),
            pushed: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Split into the producer and consumer halves
    ///
    /// The exclusive borrow guarantees there is exactly one of each for as
    /// long as the handles live.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let shared: &Self = self;
        (Producer { rb: shared }, Consumer { rb: shared })
    }

    /// Get the number of bytes currently queued
    pub fn len(&self) -> usize {
        let write = self.write.load(Ordering::Acquire);
        let read = self.read.load(Ordering::Acquire);
        (write + N - read) % N
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.read.load(Ordering::Acquire) == self.write.load(Ordering::Acquire)
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        let write = self.write.load(Ordering::Acquire);
        (write + 1) % N == self.read.load(Ordering::Acquire)
    }

    /// Usable capacity (`N - 1`)
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Get fill ratio (0.0 to 1.0) relative to the usable capacity
    pub fn fill_ratio(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    /// Get total bytes accepted since creation
    pub fn pushed(&self) -> usize {
        self.pushed.load(Ordering::Relaxed)
    }

    /// Get total bytes dropped on overflow since creation
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    fn slot(&self, index: usize) -> *mut u8 {
        debug_assert!(index < N);
        // SAFETY: `index < N`, so the offset stays inside the array.
        unsafe { self.storage.get().cast::<u8>().add(index) }
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Writing half of a [`RingBuffer`]
pub struct Producer<'a, const N: usize> {
    rb: &'a RingBuffer<N>,
}

impl<const N: usize> Producer<'_, N> {
    /// Push a byte; returns `false` and drops the byte if the buffer is full
    ///
    /// A failed push leaves contents and cursors untouched.
    pub fn push(&mut self, byte: u8) -> bool {
        let write = self.rb.write.load(Ordering::Relaxed);
        let next = (write + 1) % N;

        if next == self.rb.read.load(Ordering::Acquire) {
            // Single writer: plain load/store instead of a read-modify-write,
            // which some interrupt-driven targets do not have.
            let dropped = self.rb.dropped.load(Ordering::Relaxed);
            self.rb.dropped.store(dropped.wrapping_add(1), Ordering::Relaxed);
            return false;
        }

        // SAFETY: slot `write` is outside the consumer's window until the
        // store below publishes it.
        unsafe { self.rb.slot(write).write(byte) };
        self.rb.write.store(next, Ordering::Release);

        let pushed = self.rb.pushed.load(Ordering::Relaxed);
        self.rb.pushed.store(pushed.wrapping_add(1), Ordering::Relaxed);
        true
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.rb.is_empty()
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.rb.is_full()
    }

    /// Get the number of bytes currently queued
    pub fn len(&self) -> usize {
        self.rb.len()
    }

    /// Usable capacity (`N - 1`)
    pub fn capacity(&self) -> usize {
        self.rb.capacity()
    }

    /// Get total bytes dropped on overflow
    pub fn dropped(&self) -> usize {
        self.rb.dropped()
    }
}

/// Reading half of a [`RingBuffer`]
pub struct Consumer<'a, const N: usize> {
    rb: &'a RingBuffer<N>,
}

impl<const N: usize> Consumer<'_, N> {
    /// Pop the oldest byte, if any. Never blocks.
    pub fn pop(&mut self) -> Option<u8> {
        let read = self.rb.read.load(Ordering::Relaxed);
        if read == self.rb.write.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: slot `read` was published by the producer's Release store
        // and is not reused until the store below hands it back.
        let byte = unsafe { self.rb.slot(read).read() };
        self.rb.read.store((read + 1) % N, Ordering::Release);
        Some(byte)
    }

    /// Discard everything currently queued
    pub fn clear(&mut self) {
        let write = self.rb.write.load(Ordering::Acquire);
        let discarded = self.rb.len();
        self.rb.read.store(write, Ordering::Release);
        debug!("Cleared {} queued bytes", discarded);
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.rb.is_empty()
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.rb.is_full()
    }

    /// Get the number of bytes currently queued
    pub fn len(&self) -> usize {
        self.rb.len()
    }

    /// Get total bytes dropped on overflow
    pub fn dropped(&self) -> usize {
        self.rb.dropped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    #[test]
    fn test_reserved_slot_scenario() {
        let mut buffer = RingBuffer::<4>::new();
        let (mut tx, mut rx) = buffer.split();

        assert!(tx.push(b'A'));
        assert!(tx.push(b'B'));
        assert!(tx.push(b'C'));
        assert!(!tx.push(b'D'));
        assert_eq!(rx.pop(), Some(b'A'));
        assert!(tx.push(b'D'));

        assert_eq!(rx.pop(), Some(b'B'));
        assert_eq!(rx.pop(), Some(b'C'));
        assert_eq!(rx.pop(), Some(b'D'));
        assert!(rx.is_empty());
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_full_push_leaves_state_unchanged() {
        let mut buffer = RingBuffer::<5>::new();
        {
            let (mut tx, _rx) = buffer.split();
            for byte in 1..=4 {
                assert!(tx.push(byte));
            }
            assert!(tx.is_full());
            assert!(!tx.push(99));
            assert!(!tx.push(100));
        }

        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.dropped(), 2);
        assert_eq!(buffer.pushed(), 4);

        let (_tx, mut rx) = buffer.split();
        let drained: Vec<u8> = std::iter::from_fn(|| rx.pop()).collect();
        assert_eq!(drained, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_wraparound_keeps_order() {
        let mut buffer = RingBuffer::<3>::new();
        let (mut tx, mut rx) = buffer.split();

        for round in 0..10u8 {
            assert!(tx.push(round));
            assert!(tx.push(round + 100));
            assert_eq!(rx.pop(), Some(round));
            assert_eq!(rx.pop(), Some(round + 100));
        }
        assert!(rx.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut buffer = RingBuffer::<8>::new();
        let (mut tx, mut rx) = buffer.split();
        tx.push(1);
        tx.push(2);
        rx.clear();
        assert!(rx.is_empty());
        assert!(tx.push(3));
        assert_eq!(rx.pop(), Some(3));
    }

    #[test]
    fn test_fill_ratio() {
        let mut buffer = RingBuffer::<11>::new();
        assert_eq!(buffer.fill_ratio(), 0.0);
        {
            let (mut tx, _rx) = buffer.split();
            for i in 0..5 {
                tx.push(i);
            }
        }
        assert!((buffer.fill_ratio() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        const COUNT: usize = 100_000;
        let mut buffer = RingBuffer::<16>::new();
        let (mut tx, mut rx) = buffer.split();

        std::thread::scope(|s| {
            s.spawn(move || {
                for i in 0..COUNT {
                    while !tx.push(i as u8) {
                        std::hint::spin_loop();
                    }
                }
            });

            let mut expected = 0usize;
            while expected < COUNT {
                if let Some(byte) = rx.pop() {
                    assert_eq!(byte, expected as u8);
                    expected += 1;
                } else {
                    std::hint::spin_loop();
                }
            }
        });
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push(u8),
        Pop,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![any::<u8>().prop_map(Op::Push), Just(Op::Pop)]
    }

    proptest! {
        #[test]
        fn prop_matches_bounded_fifo(ops in proptest::collection::vec(op(), 0..200)) {
            let mut buffer = RingBuffer::<8>::new();
            let (mut tx, mut rx) = buffer.split();
            let mut model: VecDeque<u8> = VecDeque::new();

            for op in ops {
                match op {
                    Op::Push(byte) => {
                        let accepted = tx.push(byte);
                        prop_assert_eq!(accepted, model.len() < 7);
                        if accepted {
                            model.push_back(byte);
                        }
                    }
                    Op::Pop => prop_assert_eq!(rx.pop(), model.pop_front()),
                }
                prop_assert!(tx.len() <= 7);
                prop_assert_eq!(tx.len(), model.len());
            }
        }
    }
}
