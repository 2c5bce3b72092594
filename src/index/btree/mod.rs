//! B+ tree over buffer-pool pages, with bounded neighbor search.
//!
//! # Search
//! ```text
//!            locate(key)                      collect
//!  root ──▶ internal ──▶ ... ──▶ leaf ──▶ predecessors: leaf, then left
//!   │          │                           siblings of each PathRecord,
//!   └──────────┴── PathTracker             nearest ancestor first
//!                  (pages stay pinned)    successors: leaf chain →
//! ```
//!
//! Every page a search touches is borrowed through a guard; dropping the
//! guard releases it, so fetches and releases always balance.

mod builder;
mod descent;
mod neighbors;
mod node;
mod path;


use tracing::debug;

pub use builder::{BuildSummary, TreeBuilder};
pub use descent::{locate, Descent};
pub use neighbors::{collect_predecessors, collect_successors, find_position, ResultBuffer};
pub use node::{KeyEntry, Node, NodeWriter};
pub use path::{PathRecord, PathTracker};

use crate::buffer::BufferPool;
use crate::common::{Error, PageId, Result};

/// A B+ tree rooted at a fixed page of a buffer pool.
///
/// Keys handed to this type must already be normalized.
#[derive(Clone, Copy)]
pub struct BPlusTree<'p> {
    pool: &'p BufferPool,
    root: PageId,
}

impl<'p> BPlusTree<'p> {
    pub fn new(pool: &'p BufferPool, root: PageId) -> Self {
        Self { pool, root }
    }

    /// Find the leaf that should hold `key`, recording the path to it.
    pub fn locate(&self, key: &[u8]) -> Result<Descent<'p>> {
        locate(self.pool, self.root, key)
    }

    /// Up to `k` keys immediately before `key`, ascending.
    ///
    /// # Errors
    /// - `Error::InvalidK` if `k == 0`
    /// - `Error::KeyNotFound` if `key` is not stored in the tree
    /// - `Error::Corruption` / `Error::PageNotFound` for a malformed tree
    pub fn predecessors(&self, key: &[u8], k: usize) -> Result<Vec<String>> {
        if k == 0 {
            return Err(Error::InvalidK);
        }
        let Descent { leaf, path } = self.locate(key)?;
        let node = Node::read(&leaf)?;
        let (rank, found) = find_position(&node, key);
        if !found {
            return Err(Error::KeyNotFound(lossy(key)));
        }
        debug!(leaf = %leaf.page_id(), rank, depth = path.depth(), k, "collecting predecessors");
        collect_predecessors(self.pool, &node, rank, &path, k)
    }

    /// Up to `k` keys immediately after `key`, ascending.
    ///
    /// # Errors
    /// Same as [`predecessors`](Self::predecessors).
    pub fn successors(&self, key: &[u8], k: usize) -> Result<Vec<String>> {
        if k == 0 {
            return Err(Error::InvalidK);
        }
        let Descent { leaf, path } = self.locate(key)?;
        // The forward walk never backtracks.
        path.release();

        let rank = {
            let node = Node::read(&leaf)?;
            let (rank, found) = find_position(&node, key);
            if !found {
                return Err(Error::KeyNotFound(lossy(key)));
            }
            rank
        };
        debug!(leaf = %leaf.page_id(), rank, k, "collecting successors");
        collect_successors(self.pool, leaf, rank + 1, k)
    }
}

fn lossy(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
