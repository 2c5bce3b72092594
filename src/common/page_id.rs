//! Page identifier type.

use std::fmt;

use crate::common::config::PAGE_SIZE;

/// Identifies a page in the index file.
///
/// Page numbers are what tree nodes store for child and next-leaf links,
/// so the on-disk width is fixed at `u32`.
///
/// # Example
/// ```
/// use wordtree::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert!(!PageId::INVALID.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// "No page". Terminates the leaf chain and marks a missing child.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Some(self) unless this is the sentinel.
    #[inline]
    pub fn valid(self) -> Option<PageId> {
        self.is_valid().then_some(self)
    }

    /// Byte offset of this page in the index file.
    #[inline]
    pub fn file_offset(self) -> u64 {
        u64::from(self.0) * PAGE_SIZE as u64
    }

    /// Width of a page link inside a node.
    pub const ENCODED_LEN: usize = 4;

    #[inline]
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        PageId(u32::from_le_bytes(bytes))
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_invalid() {
        assert!(!PageId::INVALID.is_valid());
        assert_eq!(PageId::INVALID.valid(), None);
        assert_eq!(PageId::new(3).valid(), Some(PageId::new(3)));
    }

    #[test]
    fn test_page_id_encoding() {
        let id = PageId::new(0x0102_0304);
        assert_eq!(id.to_le_bytes(), [4, 3, 2, 1]);
        assert_eq!(PageId::from_le_bytes(id.to_le_bytes()), id);
        assert_eq!(PageId::new(3).file_offset(), 3 * PAGE_SIZE as u64);
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(42)), "Page(42)");
        assert_eq!(format!("{}", PageId::INVALID), "Page(INVALID)");
    }
}
