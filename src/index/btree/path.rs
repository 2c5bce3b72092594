//! The root-to-leaf path recorded during descent.

use crate::buffer::PageRef;
use crate::common::PageId;

/// One internal node passed on the way down.
///
/// `offset` is the rank of the entry whose child was taken, or the node's
/// key count when the rightmost child was taken. Entries `0..offset` are
/// exactly the subtrees holding keys smaller than the descent target.
#[derive(Debug)]
pub struct PathRecord<'p> {
    page: PageRef<'p>,
    offset: usize,
    child: PageId,
}

impl<'p> PathRecord<'p> {
    pub fn new(page: PageRef<'p>, offset: usize, child: PageId) -> Self {
        Self {
            page,
            offset,
            child,
        }
    }

    /// The borrowed internal page.
    #[inline]
    pub fn page(&self) -> &PageRef<'p> {
        &self.page
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page.page_id()
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Page descended into from this node.
    #[inline]
    pub fn child(&self) -> PageId {
        self.child
    }
}

/// Ordered record of internal pages visited, root first.
///
/// The tracker owns the page guards of every record, so the whole path
/// stays pinned until the tracker is released or dropped.
#[derive(Debug, Default)]
pub struct PathTracker<'p> {
    records: Vec<PathRecord<'p>>,
}

impl<'p> PathTracker<'p> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: PathRecord<'p>) {
        self.records.push(record);
    }

    /// Internal levels recorded.
    pub fn depth(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Root first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PathRecord<'p>> {
        self.records.iter()
    }

    /// Parent of the leaf first, root last.
    pub fn iter_rev(&self) -> impl Iterator<Item = &PathRecord<'p>> {
        self.records.iter().rev()
    }

    /// Release every page on the path.
    pub fn release(self) {
        drop(self);
    }
}
