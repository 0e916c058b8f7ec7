//! Eviction policy for the buffer pool.
//!
//! Implements:
//! - [`ClockReplacer`] - CLOCK (second chance), an O(1) amortized LRU
//!   approximation driven by per-frame reference bits

mod clock;

pub use clock::{ClockReplacer, Victim};
