//! Root-to-leaf descent.

use std::cmp::Ordering;

use tracing::{trace, warn};

use crate::buffer::{BufferPool, PageRef};
use crate::common::config::MAX_TREE_HEIGHT;
use crate::common::{Error, PageId, Result};
use crate::index::key::compare_keys;

use super::node::Node;
use super::path::{PathRecord, PathTracker};

/// Where a descent ended: the leaf that should hold the key, and the
/// internal pages passed on the way, all still borrowed.
#[derive(Debug)]
pub struct Descent<'p> {
    pub leaf: PageRef<'p>,
    pub path: PathTracker<'p>,
}

/// Walk from `root` to the leaf whose key range covers `key`.
///
/// At each internal node the first entry with `key <= entry.key` decides
/// the child; if `key` is greater than every entry the rightmost child is
/// taken. Each internal node is recorded with the rank of the chosen entry
/// (or the key count for the rightmost child).
///
/// # Errors
/// - `Error::Corruption` for an internal node with no entries, an
///   unreadable node, or a path longer than `MAX_TREE_HEIGHT`
/// - `Error::PageNotFound` for a child link past the end of the file
pub fn locate<'p>(pool: &'p BufferPool, root: PageId, key: &[u8]) -> Result<Descent<'p>> {
    let mut path = PathTracker::new();
    let mut page_id = root;

    for _ in 0..MAX_TREE_HEIGHT {
        let page = pool.fetch_page(page_id)?;
        let step = {
            let node = Node::read(&page)?;
            if node.is_leaf() {
                None
            } else {
                Some(descent_boundary(&node, key)?)
            }
        };

        match step {
            None => {
                trace!(leaf = %page_id, depth = path.depth(), "descent reached leaf");
                return Ok(Descent { leaf: page, path });
            }
            Some((offset, child)) => {
                trace!(%page_id, offset, %child, "descend");
                path.push(PathRecord::new(page, offset, child));
                page_id = child;
            }
        }
    }

    warn!(%root, "descent exceeded maximum tree height");
    Err(Error::corruption(format!(
        "no leaf within {} levels of {}",
        MAX_TREE_HEIGHT, root
    )))
}

/// `(offset, child)` for descending through an internal node.
fn descent_boundary(node: &Node<'_>, key: &[u8]) -> Result<(usize, PageId)> {
    if node.key_count() == 0 {
        warn!(page_id = %node.page_id(), "internal page without entries");
        return Err(Error::corruption(format!(
            "internal {} has no entries",
            node.page_id()
        )));
    }

    let boundary = node
        .entries()
        .iter()
        .position(|entry| compare_keys(key, entry.key) != Ordering::Greater);

    match boundary {
        Some(rank) => {
            let child = node.entries()[rank].child.ok_or_else(|| {
                Error::corruption(format!("entry {} of {} has no child", rank, node.page_id()))
            })?;
            Ok((rank, child))
        }
        None => {
            let child = node.rightmost_child().ok_or_else(|| {
                Error::corruption(format!("{} has no rightmost child", node.page_id()))
            })?;
            Ok((node.key_count(), child))
        }
    }
}
