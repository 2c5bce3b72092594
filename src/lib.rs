//! wordtree - a disk-paged B+ tree word index with bounded neighbor search.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  WordIndex (index/)                                             │
//! │    KeyNormalizer → BPlusTree::{predecessors, successors}        │
//! │    descent + PathTracker → ResultBuffer                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Buffer Pool (buffer/)                                          │
//! │    BufferPool + Frame + FifoReplacer + PoolStats                │
//! │    PageRef / PageMut guards: drop = release                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Storage (storage/)                                             │
//! │    DiskManager + Page + PageHeader                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, config)
//! - [`buffer`] - Page caching and scoped page borrows
//! - [`storage`] - Disk I/O and page formats
//! - [`index`] - The B+ tree and the word index built on it
//!
//! # Quick Start
//! ```no_run
//! use wordtree::{IndexOptions, WordIndex};
//!
//! let words = ["ant", "bee", "cat", "dog", "fox"];
//! let index = WordIndex::create("words.idx", words, IndexOptions::default()).unwrap();
//!
//! assert_eq!(index.find_predecessors("dog", 3).unwrap(), vec!["ant", "bee", "cat"]);
//! assert_eq!(index.find_successors("dog", 3).unwrap(), vec!["fox"]);
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;

pub use common::config::{IndexOptions, PAGE_SIZE};
pub use common::{Error, FrameId, PageId, Result};

pub use buffer::{BufferPool, PoolStats, StatsSnapshot};
pub use index::btree::BPlusTree;
pub use index::WordIndex;
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::DiskManager;
