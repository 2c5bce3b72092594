//! Disk Manager - page-granular I/O on one index file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Reads, writes and appends whole pages of an index file.
///
/// Page N starts at byte `N * PAGE_SIZE`; the file length is always a
/// whole number of pages. The buffer pool serializes access.
///
/// Writes are not synced individually. [`sync`](Self::sync) makes
/// everything written so far durable; the buffer pool calls it at the end
/// of a flush.
#[derive(Debug)]
pub struct DiskManager {
    file: File,
    path: PathBuf,
    page_count: u32,
}

impl DiskManager {
    /// Create a new, empty index file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;
        debug!(path = %path.display(), "created index file");

        Ok(Self {
            file,
            path,
            page_count: 0,
        })
    }

    /// Open an existing index file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, cannot be opened, or its
    /// length is not a whole number of pages.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let page_count = pages_in(file.metadata()?.len()).ok_or_else(|| {
            warn!(path = %path.display(), "index file has a partial page");
            Error::corruption(format!(
                "{} is not a whole number of {}-byte pages",
                path.display(),
                PAGE_SIZE
            ))
        })?;
        debug!(path = %path.display(), page_count, "opened index file");

        Ok(Self {
            file,
            path,
            page_count,
        })
    }

    /// Read page `page_id` into a fresh buffer.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` past the end of the file.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        self.seek_to(page_id)?;
        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;
        Ok(page)
    }

    /// Overwrite page `page_id`.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.seek_to(page_id)?;
        self.file.write_all(page.as_slice())?;
        Ok(())
    }

    /// Grow the file by one zeroed page and return its id.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.page_count);
        if !page_id.is_valid() {
            return Err(Error::InvalidConfig(format!(
                "{} has no page ids left",
                self.path.display()
            )));
        }
        self.file
            .set_len(PageId::new(self.page_count + 1).file_offset())?;
        self.page_count += 1;
        Ok(page_id)
    }

    /// fsync the file.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        debug!(path = %self.path.display(), pages = self.page_count, "synced index file");
        Ok(())
    }

    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn seek_to(&mut self, page_id: PageId) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }
        self.file.seek(SeekFrom::Start(page_id.file_offset()))?;
        Ok(())
    }
}

/// Whole pages in a file of `len` bytes, or None for a partial page.
fn pages_in(len: u64) -> Option<u32> {
    if len % PAGE_SIZE as u64 != 0 {
        return None;
    }
    u32::try_from(len / PAGE_SIZE as u64).ok()
}
