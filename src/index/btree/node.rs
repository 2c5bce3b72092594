//! On-page layout of B+ tree nodes.
//!
//! # Layout
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────┐
//! │ PageHeader   │ entry 0 │ entry 1 │ ... │ entry key_count-1  │
//! │ (11 bytes)   │                                            │
//! └──────────────┴──────────────────────────────────────────────┘
//!
//! leaf entry:     [key_len: u8][key bytes]
//! internal entry: [key_len: u8][key bytes][child: u32 LE]
//! ```
//!
//! `PageHeader::link` is the next leaf for leaves and the rightmost child
//! for internal nodes. An internal entry's key is the largest key in its
//! child's subtree; the rightmost child holds everything greater than the
//! last entry.

use std::cmp::Ordering;

use crate::buffer::PageRef;
use crate::common::{Error, PageId, Result};
use crate::index::key::compare_keys;
use crate::storage::page::{Page, PageHeader, PageType};

/// One key stored in a node, borrowed from the page bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry<'a> {
    pub key: &'a [u8],
    /// Subtree holding keys up to and including `key`. Internal nodes only.
    pub child: Option<PageId>,
}

impl KeyEntry<'_> {
    /// Owned copy of the key, sized from the stored length.
    pub fn to_key_string(&self) -> String {
        String::from_utf8_lossy(self.key).into_owned()
    }
}

/// A decoded view of a tree node. Borrows the page it was parsed from.
#[derive(Debug)]
pub struct Node<'a> {
    page_id: PageId,
    page_type: PageType,
    link: PageId,
    entries: Vec<KeyEntry<'a>>,
}

impl<'a> Node<'a> {
    /// Decode the node held by a page guard.
    pub fn read(guard: &'a PageRef<'_>) -> Result<Self> {
        Self::parse(guard.page_id(), guard)
    }

    /// Decode and validate the node stored in `page`.
    ///
    /// # Errors
    /// `Error::Corruption` if the checksum does not match, the page is not
    /// a tree node, an entry runs past the end of the page, an internal
    /// link is missing, or entries are not strictly increasing.
    pub fn parse(page_id: PageId, page: &'a Page) -> Result<Self> {
        if !page.is_intact() {
            return Err(Error::corruption(format!(
                "checksum mismatch on {}",
                page_id
            )));
        }
        let header = page.header();
        if !header.page_type.is_node() {
            return Err(Error::corruption(format!("{} is not a tree node", page_id)));
        }
        let is_internal = header.page_type == PageType::BTreeInternal;
        if is_internal && !header.link.is_valid() {
            return Err(Error::corruption(format!(
                "internal {} has no rightmost child",
                page_id
            )));
        }

        let body = page.body();
        let mut entries: Vec<KeyEntry<'a>> = Vec::with_capacity(header.key_count as usize);
        let mut pos = 0;
        for i in 0..header.key_count as usize {
            let overrun = || Error::corruption(format!("entry {} overruns {}", i, page_id));

            let key_len = *body.get(pos).ok_or_else(overrun)? as usize;
            let key_start = pos + 1;
            let key_end = key_start + key_len;
            let key = body.get(key_start..key_end).ok_or_else(overrun)?;
            pos = key_end;

            let child = if is_internal {
                let raw = body
                    .get(pos..pos + PageId::ENCODED_LEN)
                    .and_then(|raw| <[u8; PageId::ENCODED_LEN]>::try_from(raw).ok())
                    .ok_or_else(overrun)?;
                pos += PageId::ENCODED_LEN;
                let child = PageId::from_le_bytes(raw);
                if !child.is_valid() {
                    return Err(Error::corruption(format!(
                        "entry {} of {} has no child",
                        i, page_id
                    )));
                }
                Some(child)
            } else {
                None
            };

            if let Some(prev) = entries.last() {
                if compare_keys(prev.key, key) != Ordering::Less {
                    return Err(Error::corruption(format!(
                        "entries of {} out of order at {}",
                        page_id, i
                    )));
                }
            }
            entries.push(KeyEntry { key, child });
        }

        Ok(Self {
            page_id,
            page_type: header.page_type,
            link: header.link,
            entries,
        })
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.page_type == PageType::BTreeLeaf
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn entries(&self) -> &[KeyEntry<'a>] {
        &self.entries
    }

    /// Next leaf in key order. Leaves only; None at the end of the chain.
    pub fn next_leaf(&self) -> Option<PageId> {
        if self.is_leaf() {
            self.link.valid()
        } else {
            None
        }
    }

    /// Child covering keys above every entry. Internal nodes only.
    pub fn rightmost_child(&self) -> Option<PageId> {
        if self.is_leaf() {
            None
        } else {
            self.link.valid()
        }
    }
}

/// Encodes a node into a page.
///
/// # Example
/// ```
/// use wordtree::PageId;
/// use wordtree::index::btree::{Node, NodeWriter};
/// use wordtree::storage::page::Page;
///
/// let mut writer = NodeWriter::leaf(PageId::INVALID);
/// writer.push_key(b"ant");
/// writer.push_key(b"bee");
///
/// let mut page = Page::new();
/// writer.write(PageId::new(1), &mut page).unwrap();
/// let node = Node::parse(PageId::new(1), &page).unwrap();
/// assert_eq!(node.key_count(), 2);
/// ```
#[derive(Debug)]
pub struct NodeWriter<'k> {
    page_type: PageType,
    link: PageId,
    entries: Vec<(&'k [u8], Option<PageId>)>,
}

impl<'k> NodeWriter<'k> {
    pub fn leaf(next_leaf: PageId) -> Self {
        Self {
            page_type: PageType::BTreeLeaf,
            link: next_leaf,
            entries: Vec::new(),
        }
    }

    pub fn internal(rightmost_child: PageId) -> Self {
        Self {
            page_type: PageType::BTreeInternal,
            link: rightmost_child,
            entries: Vec::new(),
        }
    }

    /// Append a leaf key. Keys must be pushed in ascending order.
    pub fn push_key(&mut self, key: &'k [u8]) {
        self.entries.push((key, None));
    }

    /// Append a separator routing keys `<= key` to `child`.
    pub fn push_separator(&mut self, key: &'k [u8], child: PageId) {
        self.entries.push((key, Some(child)));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes the entries occupy after the header.
    pub fn encoded_len(&self) -> usize {
        let child_len = if self.page_type == PageType::BTreeInternal {
            PageId::ENCODED_LEN
        } else {
            0
        };
        self.entries
            .iter()
            .map(|(key, _)| 1 + key.len() + child_len)
            .sum()
    }

    /// Overwrite `page` with this node and stamp its checksum.
    ///
    /// # Errors
    /// `Error::NodeOverflow` if the entries do not fit in one page, a key
    /// is longer than 255 bytes, or there are more than `u16::MAX` entries.
    pub fn write(&self, page_id: PageId, page: &mut Page) -> Result<()> {
        let too_long = self.entries.iter().any(|(key, _)| key.len() > u8::MAX as usize);
        if too_long
            || self.entries.len() > u16::MAX as usize
            || self.encoded_len() > page.body().len()
        {
            return Err(Error::NodeOverflow(page_id.0));
        }

        page.reset();
        let body = page.body_mut();
        let mut pos = 0;
        for (key, child) in &self.entries {
            body[pos] = key.len() as u8;
            body[pos + 1..pos + 1 + key.len()].copy_from_slice(key);
            pos += 1 + key.len();
            if self.page_type == PageType::BTreeInternal {
                let child = child.unwrap_or(PageId::INVALID);
                body[pos..pos + PageId::ENCODED_LEN].copy_from_slice(&child.to_le_bytes());
                pos += PageId::ENCODED_LEN;
            }
        }

        page.set_header(&PageHeader::node(
            self.page_type,
            self.entries.len() as u16,
            self.link,
        ));
        page.seal();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_page(keys: &[&str], next: PageId) -> Page {
        let mut writer = NodeWriter::leaf(next);
        for key in keys {
            writer.push_key(key.as_bytes());
        }
        let mut page = Page::new();
        writer.write(PageId::new(3), &mut page).unwrap();
        page
    }

    #[test]
    fn test_leaf_layout() {
        let page = leaf_page(&["ant", "bee"], PageId::new(4));
        assert_eq!(
            &page.body()[..8],
            &[3, b'a', b'n', b't', 3, b'b', b'e', b'e']
        );

        let node = Node::parse(PageId::new(3), &page).unwrap();
        assert!(node.is_leaf());
        assert_eq!(node.key_count(), 2);
        assert_eq!(node.entries()[1].to_key_string(), "bee");
        assert_eq!(node.next_leaf(), Some(PageId::new(4)));
        assert_eq!(node.rightmost_child(), None);
    }

    #[test]
    fn test_last_leaf_has_no_next() {
        let page = leaf_page(&["cat"], PageId::INVALID);
        let node = Node::parse(PageId::new(3), &page).unwrap();
        assert_eq!(node.next_leaf(), None);
    }

    #[test]
    fn test_internal_node() {
        let mut writer = NodeWriter::internal(PageId::new(9));
        writer.push_separator(b"bee", PageId::new(7));
        writer.push_separator(b"fox", PageId::new(8));
        let mut page = Page::new();
        writer.write(PageId::new(2), &mut page).unwrap();

        let node = Node::parse(PageId::new(2), &page).unwrap();
        assert!(!node.is_leaf());
        assert_eq!(node.entries()[0].child, Some(PageId::new(7)));
        assert_eq!(node.entries()[1].key, b"fox");
        assert_eq!(node.rightmost_child(), Some(PageId::new(9)));
        assert_eq!(node.next_leaf(), None);
    }

    #[test]
    fn test_zeroed_page_is_not_a_node() {
        let mut page = Page::new();
        page.seal();
        assert!(matches!(
            Node::parse(PageId::new(1), &page),
            Err(Error::Corruption(_))
        ));
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let mut page = leaf_page(&["ant", "bee"], PageId::INVALID);
        page.body_mut()[1] = b'z';
        let err = Node::parse(PageId::new(3), &page).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_unsorted_entries_rejected() {
        let page = leaf_page(&["bee", "ant"], PageId::INVALID);
        assert!(matches!(
            Node::parse(PageId::new(3), &page),
            Err(Error::Corruption(_))
        ));
    }

    #[test]
    fn test_overrunning_entry_rejected() {
        let mut page = leaf_page(&["ant"], PageId::INVALID);
        let mut header = page.header();
        header.key_count = 2000;
        page.set_header(&header);
        page.seal();
        assert!(Node::parse(PageId::new(3), &page).is_err());
    }

    #[test]
    fn test_overflow_rejected() {
        let key = [b'a'; 64];
        let mut writer = NodeWriter::leaf(PageId::INVALID);
        for _ in 0..70 {
            writer.push_key(&key);
        }
        let mut page = Page::new();
        assert!(matches!(
            writer.write(PageId::new(5), &mut page),
            Err(Error::NodeOverflow(5))
        ));
    }
}
