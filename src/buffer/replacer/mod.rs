//! Eviction policy for the buffer pool.

mod fifo;

pub use fifo::FifoReplacer;
