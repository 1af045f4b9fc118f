//! Lock-Free Ring Buffer
//!
//! Fixed-capacity single-producer/single-consumer byte queue used for both
//! directions of the UART. The buffer is split once into a [`Producer`] and a
//! [`Consumer`]; each handle is the only writer of its own cursor, which is the
//! whole synchronization strategy between interrupt and foreground code.

mod buffer;

pub use buffer::{Consumer, Producer, RingBuffer};

/// Input (receive) buffer length in bytes
pub const INPUT_BUFFER_LEN: usize = 10;

/// Output (transmit) buffer length in bytes
pub const OUTPUT_BUFFER_LEN: usize = 48;
