//! Frame - a slot in the buffer pool.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::page::Page;

/// One slot of the buffer pool.
///
/// The page sits behind an `RwLock` so concurrent searches can read the
/// same node. `resident` names the page currently loaded; it only changes
/// while the frame is unpinned and out of the page table.
#[derive(Debug)]
pub struct Frame {
    page: RwLock<Page>,
    resident: Mutex<Option<PageId>>,
    pins: AtomicU32,
    dirty: AtomicBool,
}

impl Frame {
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
            resident: Mutex::new(None),
            pins: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    #[inline]
    pub fn resident(&self) -> Option<PageId> {
        *self.resident.lock()
    }

    /// Load `page_id` into this frame with the given contents.
    pub fn load(&self, page_id: PageId, contents: &Page) {
        self.write().as_mut_slice().copy_from_slice(contents.as_slice());
        self.dirty.store(false, Ordering::Relaxed);
        *self.resident.lock() = Some(page_id);
    }

    /// Give this frame to a freshly allocated, zeroed page.
    pub fn load_zeroed(&self, page_id: PageId) {
        self.write().reset();
        self.dirty.store(false, Ordering::Relaxed);
        *self.resident.lock() = Some(page_id);
    }

    /// Forget the resident page. The caller has already written it back.
    pub fn vacate(&self) {
        self.dirty.store(false, Ordering::Relaxed);
        *self.resident.lock() = None;
    }

    /// Returns the new pin count.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.pins.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the new pin count.
    ///
    /// # Panics
    /// Panics if the frame is not pinned: a page was released twice.
    #[inline]
    pub fn unpin(&self) -> u32 {
        let old = self.pins.fetch_sub(1, Ordering::Relaxed);
        assert!(old > 0, "pin count underflow");
        old - 1
    }

    #[inline]
    pub fn pins(&self) -> u32 {
        self.pins.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pins() > 0
    }

    #[inline]
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Relaxed);
    }

    /// Clear the dirty flag, returning whether it was set.
    #[inline]
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::Relaxed)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
