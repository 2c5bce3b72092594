//! Buffer pool - the page store searches borrow tree nodes from.
//!
//! [`BufferPool`] provides:
//! - page caching between disk and memory
//! - pin counting through [`PageRef`] / [`PageMut`] guards
//! - write-back of dirty pages on eviction and flush
//! - fetch/release accounting in [`PoolStats`]

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::buffer::replacer::FifoReplacer;
use crate::buffer::{Frame, PageMut, PageRef, PoolStats};
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::DiskManager;

/// A fixed pool of frames caching index pages.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                        BufferPool                           │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ page_table   │  │        frames: Vec<Frame>         │   │
/// │  │PageId → Fid  │─▶│  [Frame0] [Frame1] [Frame2] ...   │   │
/// │  └──────────────┘  └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │  free_list   │  │   replacer   │  │disk_manager  │      │
/// │  │ Vec<FrameId> │  │ FifoReplacer │  │   Mutex      │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// A search pins one frame per page it is currently holding, so the pool
/// must have more frames than the deepest chain of simultaneously held
/// pages (see `IndexOptions::validate`).
#[derive(Debug)]
pub struct BufferPool {
    frames: Vec<Frame>,
    page_table: RwLock<HashMap<PageId, FrameId>>,
    /// LIFO for cache locality.
    free_list: Mutex<Vec<FrameId>>,
    replacer: Mutex<FifoReplacer>,
    disk_manager: Mutex<DiskManager>,
    stats: PoolStats,
}

impl BufferPool {
    /// Create a buffer pool over `disk_manager`.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, disk_manager: DiskManager) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        Self {
            frames: (0..pool_size).map(|_| Frame::new()).collect(),
            page_table: RwLock::new(HashMap::with_capacity(pool_size)),
            free_list: Mutex::new((0..pool_size).rev().map(FrameId::new).collect()),
            replacer: Mutex::new(FifoReplacer::new(pool_size)),
            disk_manager: Mutex::new(disk_manager),
            stats: PoolStats::new(),
        }
    }

    /// Borrow a page for reading.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page doesn't exist on disk
    /// - `Error::NoFreeFrames` if all frames are pinned
    pub fn fetch_page(&self, page_id: PageId) -> Result<PageRef<'_>> {
        let frame_id = self.pin_page(page_id)?;
        PoolStats::bump(&self.stats.page_fetches);
        trace!(%page_id, %frame_id, "fetch page");
        Ok(PageRef::new(
            self,
            frame_id,
            page_id,
            self.frames[frame_id.0].read(),
        ))
    }

    /// Borrow a page for writing. The page is marked dirty on release.
    ///
    /// # Errors
    /// Same as [`fetch_page`](Self::fetch_page).
    pub fn fetch_page_mut(&self, page_id: PageId) -> Result<PageMut<'_>> {
        let frame_id = self.pin_page(page_id)?;
        PoolStats::bump(&self.stats.page_fetches);
        Ok(PageMut::new(
            self,
            frame_id,
            page_id,
            self.frames[frame_id.0].write(),
        ))
    }

    /// Append a zeroed page to the file and return it pinned for writing.
    pub fn new_page(&self) -> Result<PageMut<'_>> {
        let frame_id = self.get_free_frame()?;

        let page_id = match self.disk_manager.lock().allocate_page() {
            Ok(page_id) => page_id,
            Err(e) => {
                self.free_list.lock().push(frame_id);
                return Err(e);
            }
        };

        let frame = &self.frames[frame_id.0];
        frame.load_zeroed(page_id);
        frame.pin();
        self.page_table.write().insert(page_id, frame_id);
        self.replacer.lock().pinned(frame_id);

        PoolStats::bump(&self.stats.page_fetches);
        Ok(PageMut::new(self, frame_id, page_id, frame.write()))
    }

    /// Write every dirty resident page to disk, then fsync.
    pub fn flush_all(&self) -> Result<()> {
        let resident: Vec<(PageId, FrameId)> = self
            .page_table
            .read()
            .iter()
            .map(|(&pid, &fid)| (pid, fid))
            .collect();

        for (page_id, frame_id) in resident {
            self.write_back(frame_id, page_id)?;
        }
        self.disk_manager.lock().sync()
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    pub fn free_frame_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Number of pages in the index file. Page ids `>= page_count()` do
    /// not exist.
    pub fn page_count(&self) -> u32 {
        self.disk_manager.lock().page_count()
    }

    /// Pin count of a resident page, or None if it is not in the pool.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let frame_id = *self.page_table.read().get(&page_id)?;
        Some(self.frames[frame_id.0].pins())
    }

    /// Called by the guards on drop.
    pub(crate) fn release_page(&self, frame_id: FrameId, is_dirty: bool) {
        let frame = &self.frames[frame_id.0];
        if is_dirty {
            frame.mark_dirty();
        }
        if frame.unpin() == 0 {
            self.replacer.lock().unpinned(frame_id);
        }
        PoolStats::bump(&self.stats.page_releases);
    }

    /// Make `page_id` resident and pinned, returning its frame.
    fn pin_page(&self, page_id: PageId) -> Result<FrameId> {
        if let Some(frame_id) = self.pin_resident(page_id) {
            PoolStats::bump(&self.stats.cache_hits);
            return Ok(frame_id);
        }

        PoolStats::bump(&self.stats.cache_misses);
        let frame_id = self.get_free_frame()?;

        let contents = match self.disk_manager.lock().read_page(page_id) {
            Ok(page) => page,
            Err(e) => {
                self.free_list.lock().push(frame_id);
                return Err(e);
            }
        };
        PoolStats::bump(&self.stats.pages_read);

        let frame = &self.frames[frame_id.0];
        frame.load(page_id, &contents);
        {
            let mut table = self.page_table.write();
            if let Some(&loaded) = table.get(&page_id) {
                // Another reader loaded it first.
                self.frames[loaded.0].pin();
                drop(table);
                frame.vacate();
                self.free_list.lock().push(frame_id);
                self.replacer.lock().pinned(loaded);
                return Ok(loaded);
            }
            frame.pin();
            table.insert(page_id, frame_id);
        }
        self.replacer.lock().pinned(frame_id);

        Ok(frame_id)
    }

    /// Pin `page_id` if it is resident. The pin is taken under the page
    /// table lock so a concurrent eviction sees it.
    fn pin_resident(&self, page_id: PageId) -> Option<FrameId> {
        let frame_id = {
            let table = self.page_table.read();
            let frame_id = *table.get(&page_id)?;
            self.frames[frame_id.0].pin();
            frame_id
        };
        self.replacer.lock().pinned(frame_id);
        Some(frame_id)
    }

    fn get_free_frame(&self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.lock().pop() {
            return Ok(frame_id);
        }
        self.evict_page()
    }

    fn evict_page(&self) -> Result<FrameId> {
        loop {
            let frame_id = self.replacer.lock().victim().ok_or(Error::NoFreeFrames)?;
            let frame = &self.frames[frame_id.0];

            if let Some(old_page_id) = frame.resident() {
                if let Err(e) = self.write_back(frame_id, old_page_id) {
                    // Keep the page resident so its contents are not lost.
                    self.replacer.lock().unpinned(frame_id);
                    return Err(e);
                }

                let mut table = self.page_table.write();
                if frame.is_pinned() {
                    // Re-pinned since it was chosen; the new pin put it
                    // back in the replacer.
                    continue;
                }
                table.remove(&old_page_id);
                trace!(page_id = %old_page_id, %frame_id, "evicted page");
            }

            PoolStats::bump(&self.stats.evictions);
            frame.vacate();
            return Ok(frame_id);
        }
    }

    fn write_back(&self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let frame = &self.frames[frame_id.0];
        if !frame.take_dirty() {
            return Ok(());
        }
        let page = frame.read();
        if let Err(e) = self.disk_manager.lock().write_page(page_id, &page) {
            frame.mark_dirty();
            return Err(e);
        }
        PoolStats::bump(&self.stats.pages_written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_pool(pool_size: usize) -> (BufferPool, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let dm = DiskManager::create(dir.path().join("test.idx")).unwrap();
        (BufferPool::new(pool_size, dm), dir)
    }

    #[test]
    fn test_new_page_ids_are_sequential() {
        let (pool, _dir) = create_test_pool(4);
        assert_eq!(pool.new_page().unwrap().page_id(), PageId::new(0));
        assert_eq!(pool.new_page().unwrap().page_id(), PageId::new(1));
        assert_eq!(pool.page_count(), 2);
    }

    #[test]
    fn test_write_then_read() {
        let (pool, _dir) = create_test_pool(4);
        {
            let mut guard = pool.new_page().unwrap();
            guard.as_mut_slice()[0] = 0xAB;
        }
        let guard = pool.fetch_page(PageId::new(0)).unwrap();
        assert_eq!(guard.as_slice()[0], 0xAB);
    }

    #[test]
    fn test_every_fetch_is_released() {
        let (pool, _dir) = create_test_pool(4);
        drop(pool.new_page().unwrap());
        {
            let _a = pool.fetch_page(PageId::new(0)).unwrap();
            let _b = pool.fetch_page(PageId::new(0)).unwrap();
            assert_eq!(pool.pin_count(PageId::new(0)), Some(2));
            assert_eq!(pool.stats().outstanding(), 2);
        }
        assert_eq!(pool.pin_count(PageId::new(0)), Some(0));
        assert_eq!(pool.stats().outstanding(), 0);

        let snapshot = pool.stats().snapshot();
        assert_eq!(snapshot.page_fetches, snapshot.page_releases);
        assert_eq!(snapshot.cache_hits, 2);
    }

    #[test]
    fn test_dirty_page_survives_eviction() {
        let (pool, _dir) = create_test_pool(1);
        {
            let mut guard = pool.new_page().unwrap();
            guard.as_mut_slice()[0] = 0x42;
        }
        drop(pool.new_page().unwrap());

        let guard = pool.fetch_page(PageId::new(0)).unwrap();
        assert_eq!(guard.as_slice()[0], 0x42);
        assert!(pool.stats().snapshot().evictions >= 2);
    }

    #[test]
    fn test_no_free_frames() {
        let (pool, _dir) = create_test_pool(2);
        let _guard1 = pool.new_page().unwrap();
        let _guard2 = pool.new_page().unwrap();
        assert!(matches!(pool.new_page(), Err(Error::NoFreeFrames)));
    }

    #[test]
    fn test_page_not_found_returns_frame() {
        let (pool, _dir) = create_test_pool(2);
        assert!(matches!(
            pool.fetch_page(PageId::new(999)),
            Err(Error::PageNotFound(999))
        ));
        assert_eq!(pool.free_frame_count(), 2);
        assert_eq!(pool.stats().outstanding(), 0);
    }

    #[test]
    fn test_flush_all_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");
        {
            let pool = BufferPool::new(4, DiskManager::create(&path).unwrap());
            let mut guard = pool.new_page().unwrap();
            guard.as_mut_slice()[7] = 7;
            drop(guard);
            pool.flush_all().unwrap();
        }
        let pool = BufferPool::new(4, DiskManager::open(&path).unwrap());
        assert_eq!(pool.fetch_page(PageId::new(0)).unwrap().as_slice()[7], 7);
    }
}
