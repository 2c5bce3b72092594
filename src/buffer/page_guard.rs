//! RAII guards for page access.
//!
//! - [`PageRef`] - shared, read-only borrow of a resident page
//! - [`PageMut`] - exclusive borrow that marks the page dirty
//!
//! Dropping a guard releases the page. There is no other way to release
//! one, so every fetch is matched by exactly one release on every exit
//! path, including `?` returns and early loop exits.

use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId};
use crate::storage::page::Page;

use super::buffer_pool::BufferPool;

/// Shared access to a page in the buffer pool.
///
/// # Example
/// ```ignore
/// let guard = pool.fetch_page(page_id)?;
/// let header = guard.header();  // Deref to &Page
/// // guard drops here, page unpinned
/// ```
pub struct PageRef<'a> {
    pool: &'a BufferPool,
    frame_id: FrameId,
    page_id: PageId,
    lock: RwLockReadGuard<'a, Page>,
}

impl<'a> PageRef<'a> {
    pub(crate) fn new(
        pool: &'a BufferPool,
        frame_id: FrameId,
        page_id: PageId,
        lock: RwLockReadGuard<'a, Page>,
    ) -> Self {
        Self {
            pool,
            frame_id,
            page_id,
            lock,
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }
}

impl Deref for PageRef<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

impl Drop for PageRef<'_> {
    fn drop(&mut self) {
        self.pool.release_page(self.frame_id, false);
    }
}

impl fmt::Debug for PageRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRef")
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame_id)
            .finish()
    }
}

/// Exclusive access to a page in the buffer pool.
///
/// The page is marked dirty and unpinned when the guard drops.
pub struct PageMut<'a> {
    pool: &'a BufferPool,
    frame_id: FrameId,
    page_id: PageId,
    lock: RwLockWriteGuard<'a, Page>,
}

impl<'a> PageMut<'a> {
    pub(crate) fn new(
        pool: &'a BufferPool,
        frame_id: FrameId,
        page_id: PageId,
        lock: RwLockWriteGuard<'a, Page>,
    ) -> Self {
        Self {
            pool,
            frame_id,
            page_id,
            lock,
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }
}

impl Deref for PageMut<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

impl DerefMut for PageMut<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        &mut self.lock
    }
}

impl Drop for PageMut<'_> {
    fn drop(&mut self) {
        self.pool.release_page(self.frame_id, true);
    }
}
