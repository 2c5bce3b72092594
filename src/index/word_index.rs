//! The public entry point: a word index stored in one file.

use std::path::Path;

use tracing::debug;

use crate::buffer::{BufferPool, PoolStats};
use crate::common::config::{IndexOptions, ROOT_PAGE_ID};
use crate::common::{Error, Result};
use crate::storage::DiskManager;

use super::btree::{BPlusTree, BuildSummary, TreeBuilder};
use super::normalize::KeyNormalizer;

/// A B+ tree of words answering "what comes just before / after this word".
///
/// Requests are validated before the tree is touched: `k == 0` and keys the
/// normalizer rejects fail without fetching a single page.
///
/// # Example
/// ```no_run
/// use wordtree::{IndexOptions, WordIndex};
///
/// let index = WordIndex::create("words.idx", ["ant", "bee", "cat", "dog"], IndexOptions::default())?;
/// assert_eq!(index.find_predecessors("dog", 2)?, vec!["bee", "cat"]);
/// assert_eq!(index.find_successors("ant", 1)?, vec!["bee"]);
/// # Ok::<(), wordtree::Error>(())
/// ```
#[derive(Debug)]
pub struct WordIndex {
    pool: BufferPool,
    normalizer: KeyNormalizer,
}

impl WordIndex {
    /// Wrap a buffer pool whose file already holds a tree.
    ///
    /// # Errors
    /// `Error::InvalidConfig` for invalid options, `Error::Corruption` if
    /// the file has no root page.
    pub fn new(pool: BufferPool, options: &IndexOptions) -> Result<Self> {
        options.validate()?;
        if pool.page_count() <= ROOT_PAGE_ID.0 {
            return Err(Error::corruption("index file has no root page"));
        }
        Ok(Self {
            pool,
            normalizer: KeyNormalizer::from_options(options),
        })
    }

    /// Open an existing index file.
    pub fn open<P: AsRef<Path>>(path: P, options: IndexOptions) -> Result<Self> {
        options.validate()?;
        let pool = BufferPool::new(options.pool_size, DiskManager::open(path)?);
        Self::new(pool, &options)
    }

    /// Create a new index file holding `keys`.
    pub fn create<P, I, S>(path: P, keys: I, options: IndexOptions) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::create_with_summary(path, keys, options)?.0)
    }

    /// [`create`](Self::create), also reporting what the bulk load did.
    pub fn create_with_summary<P, I, S>(
        path: P,
        keys: I,
        options: IndexOptions,
    ) -> Result<(Self, BuildSummary)>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        options.validate()?;
        let pool = BufferPool::new(options.pool_size, DiskManager::create(path)?);
        let summary = TreeBuilder::new(&pool, &options).build(keys)?;
        Ok((Self::new(pool, &options)?, summary))
    }

    /// Up to `k` stored keys immediately before `raw_key`, ascending.
    ///
    /// # Errors
    /// - `Error::InvalidK`, `Error::KeyTooLong`, `Error::StopWord`,
    ///   `Error::MalformedKey`: request rejected, no page fetched
    /// - `Error::KeyNotFound`: `raw_key` is not in the index
    /// - `Error::Corruption` and I/O errors from the store
    pub fn find_predecessors(&self, raw_key: &str, k: usize) -> Result<Vec<String>> {
        let key = self.validate(raw_key, k)?;
        let keys = self.tree().predecessors(key.as_bytes(), k)?;
        debug!(%key, k, found = keys.len(), "predecessor search");
        Ok(keys)
    }

    /// Up to `k` stored keys immediately after `raw_key`, ascending.
    ///
    /// # Errors
    /// Same as [`find_predecessors`](Self::find_predecessors).
    pub fn find_successors(&self, raw_key: &str, k: usize) -> Result<Vec<String>> {
        let key = self.validate(raw_key, k)?;
        let keys = self.tree().successors(key.as_bytes(), k)?;
        debug!(%key, k, found = keys.len(), "successor search");
        Ok(keys)
    }

    pub fn stats(&self) -> &PoolStats {
        self.pool.stats()
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    fn tree(&self) -> BPlusTree<'_> {
        BPlusTree::new(&self.pool, ROOT_PAGE_ID)
    }

    fn validate(&self, raw_key: &str, k: usize) -> Result<String> {
        if k == 0 {
            return Err(Error::InvalidK);
        }
        self.normalizer.normalize(raw_key)
    }
}
