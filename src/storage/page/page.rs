//! Page - one fixed-size block of the index file.

use crate::common::config::PAGE_SIZE;

use super::page_header::PageHeader;

/// One page of the index file: a [`PageHeader`] followed by the node body.
///
/// Not `Clone` outside tests; pages move between disk and frames by
/// explicit copies.
///
/// # Example
/// ```
/// use wordtree::storage::page::{Page, PageHeader, PageType};
///
/// let mut page = Page::new();
/// page.set_header(&PageHeader::new(PageType::BTreeLeaf));
/// page.seal();
/// assert!(page.is_intact());
/// ```
#[derive(Debug)]
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Entry bytes, after the header.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.data[PageHeader::SIZE..]
    }

    #[inline]
    pub fn body_mut(&mut self) -> &mut [u8] {
        &mut self.data[PageHeader::SIZE..]
    }

    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    pub fn header(&self) -> PageHeader {
        PageHeader::from_bytes(&self.data)
    }

    pub fn set_header(&mut self, header: &PageHeader) {
        header.write_to(&mut self.data);
    }

    /// Stamp the checksum of the current contents into the header. Any
    /// later change to the page breaks [`is_intact`](Self::is_intact).
    pub fn seal(&mut self) {
        let mut header = self.header();
        header.checksum = PageHeader::compute_checksum(&self.data);
        self.set_header(&header);
    }

    /// Whether the stored checksum matches the contents.
    pub fn is_intact(&self) -> bool {
        self.header().verify_checksum(&self.data)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut copy = Page::new();
        copy.data.copy_from_slice(&self.data);
        copy
    }
}
