//! Configuration for wordtree.
//!
//! Compile-time constants describe the on-disk format; [`IndexOptions`]
//! carries the runtime knobs an index is opened or built with.

use std::collections::HashSet;

use super::error::{Error, Result};
use super::page_id::PageId;
use crate::storage::page::PageHeader;

/// Size of a page in bytes (4KB).
pub const PAGE_SIZE: usize = 4096;

/// Longest key the index stores, in bytes. Key lengths are stored as `u8`.
pub const MAX_KEY_LEN: usize = 64;

/// The root node always lives in page 0.
pub const ROOT_PAGE_ID: PageId = PageId(0);

/// Deepest root-to-leaf path a search will follow before declaring the
/// tree corrupt.
pub const MAX_TREE_HEIGHT: usize = 16;

/// Frames in the buffer pool unless configured otherwise.
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Words that are never indexed and never searched for.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "if", "in", "into",
    "is", "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

/// Bytes available for entries after the page header.
pub const NODE_BODY_SIZE: usize = PAGE_SIZE - PageHeader::SIZE;

/// Bytes a leaf entry needs for a key of `key_len` bytes.
#[inline]
pub const fn leaf_entry_size(key_len: usize) -> usize {
    1 + key_len
}

/// Bytes an internal entry needs for a key of `key_len` bytes.
#[inline]
pub const fn internal_entry_size(key_len: usize) -> usize {
    1 + key_len + 4
}

/// Runtime options for opening or building an index.
///
/// # Example
/// ```
/// use wordtree::IndexOptions;
///
/// let options = IndexOptions::default()
///     .with_pool_size(128)
///     .with_leaf_capacity(8);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Frames in the buffer pool.
    pub pool_size: usize,
    /// Longest accepted key in bytes.
    pub max_key_len: usize,
    /// Most entries the bulk loader packs into one leaf.
    pub leaf_capacity: usize,
    /// Most children the bulk loader gives one internal node.
    pub internal_fanout: usize,
    /// Words rejected by the normalizer.
    pub stop_words: HashSet<String>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            max_key_len: MAX_KEY_LEN,
            leaf_capacity: NODE_BODY_SIZE / leaf_entry_size(MAX_KEY_LEN),
            internal_fanout: NODE_BODY_SIZE / internal_entry_size(MAX_KEY_LEN) + 1,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl IndexOptions {
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_max_key_len(mut self, max_key_len: usize) -> Self {
        self.max_key_len = max_key_len;
        self
    }

    pub fn with_leaf_capacity(mut self, leaf_capacity: usize) -> Self {
        self.leaf_capacity = leaf_capacity;
        self
    }

    pub fn with_internal_fanout(mut self, internal_fanout: usize) -> Self {
        self.internal_fanout = internal_fanout;
        self
    }

    /// Replace the stop-word list.
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Check that these options can describe a well-formed tree.
    ///
    /// # Errors
    /// `Error::InvalidConfig` naming the first offending option.
    pub fn validate(&self) -> Result<()> {
        // A predecessor search pins the whole path plus one page per level
        // of the sibling subtree it is draining, plus the leaf.
        let min_pool = 2 * MAX_TREE_HEIGHT + 2;
        if self.pool_size < min_pool {
            return Err(Error::InvalidConfig(format!(
                "pool_size {} is below the minimum of {}",
                self.pool_size, min_pool
            )));
        }
        if self.max_key_len == 0 || self.max_key_len > MAX_KEY_LEN {
            return Err(Error::InvalidConfig(format!(
                "max_key_len must be in 1..={}, got {}",
                MAX_KEY_LEN, self.max_key_len
            )));
        }
        if self.leaf_capacity == 0 {
            return Err(Error::InvalidConfig("leaf_capacity must be positive".into()));
        }
        if self.internal_fanout < 3 {
            return Err(Error::InvalidConfig(format!(
                "internal_fanout must be at least 3, got {}",
                self.internal_fanout
            )));
        }
        if self.leaf_capacity * leaf_entry_size(self.max_key_len) > NODE_BODY_SIZE {
            return Err(Error::InvalidConfig(format!(
                "leaf_capacity {} cannot fit in a page with {}-byte keys",
                self.leaf_capacity, self.max_key_len
            )));
        }
        if (self.internal_fanout - 1) * internal_entry_size(self.max_key_len) > NODE_BODY_SIZE {
            return Err(Error::InvalidConfig(format!(
                "internal_fanout {} cannot fit in a page with {}-byte keys",
                self.internal_fanout, self.max_key_len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_key_len_fits_length_byte() {
        assert!(MAX_KEY_LEN <= u8::MAX as usize);
    }

    #[test]
    fn test_default_options_are_valid() {
        let options = IndexOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.leaf_capacity, 62);
        assert_eq!(options.internal_fanout, 60);
        assert!(options.stop_words.contains("the"));
    }

    #[test]
    fn test_small_pool_rejected() {
        let options = IndexOptions::default().with_pool_size(4);
        assert!(matches!(options.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_fanout_below_three_rejected() {
        let options = IndexOptions::default().with_internal_fanout(2);
        assert!(matches!(options.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_leaf_rejected() {
        let options = IndexOptions::default().with_leaf_capacity(1000);
        assert!(options.validate().is_err());

        // Shorter keys leave room for more entries.
        let options = IndexOptions::default()
            .with_max_key_len(8)
            .with_leaf_capacity(400);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_stop_words_replaced() {
        let options = IndexOptions::default().with_stop_words(["zzz"]);
        assert_eq!(options.stop_words.len(), 1);
        assert!(!options.stop_words.contains("the"));
    }
}
