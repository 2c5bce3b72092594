//! Bounded neighbor collection around a located key.
//!
//! Predecessors are gathered right to left: first from the leaf, then from
//! the sibling subtrees to the left of the descent path, nearest ancestor
//! first. Successors follow the leaf chain to the right.

use tracing::{debug, trace};

use crate::buffer::{BufferPool, PageRef};
use crate::common::config::MAX_TREE_HEIGHT;
use crate::common::{Error, PageId, Result};
use crate::index::key::find_insertion_rank;

use super::node::{KeyEntry, Node};
use super::path::PathTracker;

/// Initial allocation for a result buffer; `k` may be far larger than the index.
const RESULT_HINT: usize = 64;

/// Up to `capacity` keys, kept in collection order.
#[derive(Debug)]
pub struct ResultBuffer {
    keys: Vec<String>,
    capacity: usize,
}

impl ResultBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity.min(RESULT_HINT)),
            capacity,
        }
    }

    /// Keys still wanted.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.keys.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.keys.len() == self.capacity
    }

    /// Copy entries in iteration order until the buffer is full.
    /// Returns how many were taken.
    pub fn extend<'e, 'k: 'e, I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = &'e KeyEntry<'k>>,
    {
        let before = self.keys.len();
        let wanted = self.remaining();
        self.keys
            .extend(entries.into_iter().take(wanted).map(|entry| entry.to_key_string()));
        self.keys.len() - before
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in the order they were collected.
    pub fn into_vec(self) -> Vec<String> {
        self.keys
    }

    /// Keys collected in descending order, returned ascending.
    pub fn into_reversed(mut self) -> Vec<String> {
        self.keys.reverse();
        self.keys
    }
}

/// Rank of `key` in a leaf and whether it is stored there.
pub fn find_position(leaf: &Node<'_>, key: &[u8]) -> (usize, bool) {
    find_insertion_rank(leaf.entries(), key)
}

/// The `k` keys preceding `rank` in `leaf`, continuing into the subtrees
/// left of `path` when the leaf runs out. Returned in ascending order.
///
/// `rank` is the position of the query key in `leaf`; every entry before
/// it is a predecessor.
pub fn collect_predecessors(
    pool: &BufferPool,
    leaf: &Node<'_>,
    rank: usize,
    path: &PathTracker<'_>,
    k: usize,
) -> Result<Vec<String>> {
    let mut buffer = ResultBuffer::new(k);
    buffer.extend(leaf.entries()[..rank].iter().rev());
    if buffer.is_full() {
        debug!(leaf = %leaf.page_id(), k, "predecessors found in leaf");
        return Ok(buffer.into_reversed());
    }

    for record in path.iter_rev() {
        let node = Node::read(record.page())?;
        let left_siblings = node.entries().get(..record.offset()).ok_or_else(|| {
            Error::corruption(format!(
                "offset {} past the end of {}",
                record.offset(),
                record.page_id()
            ))
        })?;

        for entry in left_siblings.iter().rev() {
            let child = entry.child.ok_or_else(|| {
                Error::corruption(format!("separator in {} has no child", record.page_id()))
            })?;
            harvest_reverse(pool, child, &mut buffer, MAX_TREE_HEIGHT)?;
            if buffer.is_full() {
                debug!(ancestor = %record.page_id(), k, "predecessors complete");
                return Ok(buffer.into_reversed());
            }
        }
        trace!(ancestor = %record.page_id(), remaining = buffer.remaining(), "backtrack");
    }

    debug!(found = buffer.len(), k, "fewer predecessors than requested");
    Ok(buffer.into_reversed())
}

/// Append the largest keys of the subtree at `page_id` to `buffer`, in
/// descending order, until it is full.
fn harvest_reverse(
    pool: &BufferPool,
    page_id: PageId,
    buffer: &mut ResultBuffer,
    levels_left: usize,
) -> Result<()> {
    if buffer.is_full() {
        return Ok(());
    }
    if levels_left == 0 {
        return Err(Error::corruption(format!(
            "subtree at {} deeper than {} levels",
            page_id, MAX_TREE_HEIGHT
        )));
    }

    let page = pool.fetch_page(page_id)?;
    let node = Node::read(&page)?;

    if node.is_leaf() {
        let taken = buffer.extend(node.entries().iter().rev());
        trace!(%page_id, taken, "harvested leaf");
        return Ok(());
    }

    let rightmost = node.rightmost_child().ok_or_else(|| {
        Error::corruption(format!("{} has no rightmost child", page_id))
    })?;
    if node.key_count() == 0 {
        return Err(Error::corruption(format!(
            "internal {} has no entries",
            page_id
        )));
    }

    harvest_reverse(pool, rightmost, buffer, levels_left - 1)?;
    for entry in node.entries().iter().rev() {
        if buffer.is_full() {
            break;
        }
        let child = entry.child.ok_or_else(|| {
            Error::corruption(format!("separator in {} has no child", page_id))
        })?;
        harvest_reverse(pool, child, buffer, levels_left - 1)?;
    }
    Ok(())
}

/// Up to `k` keys from position `start` of `leaf` onward, following the
/// leaf chain. Returned in ascending order.
///
/// Each exhausted leaf is released as soon as the next one is pinned. A
/// next-leaf link that is unset or points past the end of the file ends
/// the walk.
pub fn collect_successors<'p>(
    pool: &'p BufferPool,
    mut leaf: PageRef<'p>,
    mut start: usize,
    k: usize,
) -> Result<Vec<String>> {
    let mut buffer = ResultBuffer::new(k);
    let page_count = pool.page_count();
    let mut hops = 0u32;

    loop {
        let next = {
            let node = Node::read(&leaf)?;
            if !node.is_leaf() {
                return Err(Error::corruption(format!(
                    "leaf chain reached internal {}",
                    leaf.page_id()
                )));
            }
            let taken = buffer.extend(node.entries().iter().skip(start));
            trace!(page_id = %leaf.page_id(), taken, "harvested leaf");
            if buffer.is_full() {
                break;
            }
            node.next_leaf()
        };

        let Some(next) = next.filter(|p| p.0 < page_count) else {
            debug!(found = buffer.len(), k, "leaf chain ended");
            break;
        };

        hops += 1;
        if hops >= page_count {
            return Err(Error::corruption(format!(
                "leaf chain from {} does not terminate",
                leaf.page_id()
            )));
        }
        leaf = pool.fetch_page(next)?;
        start = 0;
    }

    Ok(buffer.into_vec())
}
