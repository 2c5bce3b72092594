//! Buffer pool management.
//!
//! The buffer pool is the page store: tree searches borrow nodes from it
//! and give them back by dropping the guard.
//!
//! - [`BufferPool`] - The page cache
//! - [`Frame`] - A slot holding one page + metadata
//! - [`PageRef`] / [`PageMut`] - RAII guards for page access
//! - [`PoolStats`] - Fetch/release and cache counters
//! - [`replacer`] - Eviction policy

mod buffer_pool;
mod frame;
mod page_guard;
pub mod replacer;
mod stats;

pub use buffer_pool::BufferPool;
pub use frame::Frame;
pub use page_guard::{PageMut, PageRef};
pub use stats::{PoolStats, StatsSnapshot};
