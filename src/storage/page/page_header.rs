//! Page header and type definitions.
//!
//! Every page starts with a [`PageHeader`]:
//! - [`PageType`] discriminator (leaf or internal node)
//! - CRC32 checksum for integrity
//! - number of key entries stored after the header
//! - one page link whose meaning depends on the page type

use crate::common::PageId;

/// Type of page stored on disk.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Uninitialized or corrupted page.
    #[default]
    Invalid = 0,
    /// B+ tree internal (routing) node.
    BTreeInternal = 1,
    /// B+ tree leaf node.
    BTreeLeaf = 2,
}

impl From<u8> for PageType {
    /// Unknown tags decode as `Invalid`.
    fn from(tag: u8) -> Self {
        match tag {
            1 => PageType::BTreeInternal,
            2 => PageType::BTreeLeaf,
            _ => PageType::Invalid,
        }
    }
}

impl PageType {
    #[inline]
    pub fn is_node(self) -> bool {
        self != PageType::Invalid
    }
}

/// Metadata stored at the beginning of every page.
///
/// # Layout (11 bytes, little-endian)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     page_type (PageType as u8)
/// 1       4     checksum (CRC32)
/// 5       2     key_count
/// 7       4     link (next leaf, or rightmost child for internal pages)
/// ```
///
/// The checksum covers the whole page with the checksum field read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub checksum: u32,
    pub key_count: u16,
    pub link: PageId,
}

impl Default for PageHeader {
    fn default() -> Self {
        Self::new(PageType::Invalid)
    }
}

impl PageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 11;

    pub const OFFSET_PAGE_TYPE: usize = 0;
    pub const OFFSET_CHECKSUM: usize = 1;
    pub const OFFSET_KEY_COUNT: usize = 5;
    pub const OFFSET_LINK: usize = 7;

    /// Create an empty header with no link.
    pub fn new(page_type: PageType) -> Self {
        Self::node(page_type, 0, PageId::INVALID)
    }

    /// Header for a node holding `key_count` entries. The checksum is
    /// filled in when the page is sealed.
    pub fn node(page_type: PageType, key_count: u16, link: PageId) -> Self {
        Self {
            page_type,
            checksum: 0,
            key_count,
            link,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        let page_type = PageType::from(data[Self::OFFSET_PAGE_TYPE]);
        let checksum = u32::from_le_bytes(read_array(data, Self::OFFSET_CHECKSUM));
        let key_count = u16::from_le_bytes(read_array(data, Self::OFFSET_KEY_COUNT));
        let link = PageId::from_le_bytes(read_array(data, Self::OFFSET_LINK));

        Self {
            page_type,
            checksum,
            key_count,
            link,
        }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        data[Self::OFFSET_PAGE_TYPE] = self.page_type as u8;
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&self.checksum.to_le_bytes());
        data[Self::OFFSET_KEY_COUNT..Self::OFFSET_KEY_COUNT + 2]
            .copy_from_slice(&self.key_count.to_le_bytes());
        data[Self::OFFSET_LINK..Self::OFFSET_LINK + 4].copy_from_slice(&self.link.to_le_bytes());
    }

    /// Compute the CRC32 of a page, treating the checksum field as zero.
    pub fn compute_checksum(page_data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&page_data[..Self::OFFSET_CHECKSUM]);
        hasher.update(&[0u8; 4]);
        hasher.update(&page_data[Self::OFFSET_CHECKSUM + 4..]);
        hasher.finalize()
    }

    /// Whether the stored checksum matches the page contents.
    pub fn verify_checksum(&self, page_data: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(page_data)
    }
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&data[offset..offset + N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::PAGE_SIZE;

    #[test]
    fn test_page_type_tags() {
        assert_eq!(PageType::from(0), PageType::Invalid);
        assert_eq!(PageType::from(1), PageType::BTreeInternal);
        assert_eq!(PageType::from(2), PageType::BTreeLeaf);
        assert_eq!(PageType::from(255), PageType::Invalid);
        assert!(!PageType::Invalid.is_node());
        assert!(PageType::BTreeLeaf.is_node());
    }

    #[test]
    fn test_default_header_has_no_link() {
        let header = PageHeader::default();
        assert_eq!(header.page_type, PageType::Invalid);
        assert_eq!(header.key_count, 0);
        assert!(!header.link.is_valid());
    }

    #[test]
    fn test_page_header_byte_layout() {
        let header = PageHeader {
            checksum: 0x04030201,
            ..PageHeader::node(PageType::BTreeLeaf, 0x0605, PageId(0x0A090807))
        };

        let mut buffer = [0u8; PageHeader::SIZE];
        header.write_to(&mut buffer);

        assert_eq!(buffer, [2, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(PageHeader::from_bytes(&buffer), header);
    }

    #[test]
    fn test_checksum_ignores_checksum_field() {
        let mut page_data = [0u8; PAGE_SIZE];
        page_data[100] = 0xAB;

        let checksum1 = PageHeader::compute_checksum(&page_data);
        page_data[1..5].copy_from_slice(&[0xFF; 4]);
        let checksum2 = PageHeader::compute_checksum(&page_data);

        assert_eq!(checksum1, checksum2);
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut page_data = [0u8; PAGE_SIZE];
        page_data[PageHeader::SIZE] = 3;

        let header = PageHeader {
            checksum: PageHeader::compute_checksum(&page_data),
            ..PageHeader::new(PageType::BTreeLeaf)
        };
        assert!(header.verify_checksum(&page_data));

        page_data[PageHeader::SIZE] = 4;
        assert!(!header.verify_checksum(&page_data));
    }
}
