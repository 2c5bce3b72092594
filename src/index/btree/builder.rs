//! Bulk loading a tree from a key set.

use std::ops::Range;

use tracing::{debug, info};

use crate::buffer::BufferPool;
use crate::common::config::{IndexOptions, MAX_TREE_HEIGHT, ROOT_PAGE_ID};
use crate::common::{Error, PageId, Result};
use crate::index::key::compare_keys;
use crate::index::normalize::KeyNormalizer;

use super::node::NodeWriter;

/// What [`TreeBuilder::build`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    /// Distinct keys stored.
    pub keys: usize,
    /// Inputs rejected by the normalizer.
    pub skipped: usize,
    pub leaves: usize,
    /// Levels including the leaf level.
    pub height: usize,
    pub pages: u32,
}

/// Lays out a complete tree in an empty index file.
///
/// Keys are normalized, sorted and deduplicated, then packed into leaves
/// of at most `leaf_capacity` entries linked left to right. Internal levels
/// are built bottom-up with at most `internal_fanout` children each; sizes
/// within a level differ by at most one, so every internal node has at
/// least two children. The top node is written to [`ROOT_PAGE_ID`].
pub struct TreeBuilder<'p> {
    pool: &'p BufferPool,
    options: &'p IndexOptions,
    normalizer: KeyNormalizer,
}

/// A finished subtree: its page and the largest key it holds.
struct Subtree {
    page_id: PageId,
    max_key: String,
}

impl<'p> TreeBuilder<'p> {
    pub fn new(pool: &'p BufferPool, options: &'p IndexOptions) -> Self {
        Self {
            pool,
            options,
            normalizer: KeyNormalizer::from_options(options),
        }
    }

    /// Build the tree and flush it to disk.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` if the options are invalid, the file
    ///   already has pages, or the keys need more than `MAX_TREE_HEIGHT` levels
    /// - `Error::NodeOverflow` if a node cannot fit in a page
    /// - I/O and buffer pool errors
    pub fn build<I, S>(&self, keys: I) -> Result<BuildSummary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.options.validate()?;
        if self.pool.page_count() != 0 {
            return Err(Error::InvalidConfig(
                "bulk load requires an empty index file".into(),
            ));
        }

        let mut skipped = 0;
        let mut sorted: Vec<String> = Vec::new();
        for raw in keys {
            match self.normalizer.normalize(raw.as_ref()) {
                Ok(key) => sorted.push(key),
                Err(e) => {
                    debug!(key = raw.as_ref(), error = %e, "skipping key");
                    skipped += 1;
                }
            }
        }
        sorted.sort_by(|a, b| compare_keys(a.as_bytes(), b.as_bytes()));
        sorted.dedup();

        let planned = tree_height(
            sorted.len(),
            self.options.leaf_capacity,
            self.options.internal_fanout,
        );
        if planned > MAX_TREE_HEIGHT {
            return Err(Error::InvalidConfig(format!(
                "{} keys need {} levels, at most {} are searchable",
                sorted.len(),
                planned,
                MAX_TREE_HEIGHT
            )));
        }

        let root = self.pool.new_page()?.page_id();
        if root != ROOT_PAGE_ID {
            return Err(Error::InvalidConfig(format!(
                "root was allocated at {} instead of {}",
                root, ROOT_PAGE_ID
            )));
        }

        let (leaves, height) = if sorted.len() <= self.options.leaf_capacity {
            self.write_leaf(ROOT_PAGE_ID, &sorted, PageId::INVALID)?;
            (1, 1)
        } else {
            let mut level = self.write_leaf_level(&sorted)?;
            let leaves = level.len();
            let mut height = 2;
            while level.len() > self.options.internal_fanout {
                level = self.write_internal_level(&level)?;
                height += 1;
            }
            self.write_internal(ROOT_PAGE_ID, &level)?;
            (leaves, height)
        };

        self.pool.flush_all()?;
        let summary = BuildSummary {
            keys: sorted.len(),
            skipped,
            leaves,
            height,
            pages: self.pool.page_count(),
        };
        info!(?summary, "bulk load complete");
        Ok(summary)
    }

    fn write_leaf_level(&self, keys: &[String]) -> Result<Vec<Subtree>> {
        let groups = even_groups(keys.len(), self.options.leaf_capacity);
        let ids = self.allocate(groups.len())?;

        let mut level = Vec::with_capacity(groups.len());
        for (i, range) in groups.into_iter().enumerate() {
            let next = ids.get(i + 1).copied().unwrap_or(PageId::INVALID);
            let chunk = &keys[range];
            self.write_leaf(ids[i], chunk, next)?;
            level.push(Subtree {
                page_id: ids[i],
                max_key: chunk.last().cloned().unwrap_or_default(),
            });
        }
        Ok(level)
    }

    fn write_internal_level(&self, children: &[Subtree]) -> Result<Vec<Subtree>> {
        let groups = even_groups(children.len(), self.options.internal_fanout);
        let ids = self.allocate(groups.len())?;

        let mut level = Vec::with_capacity(groups.len());
        for (page_id, range) in ids.into_iter().zip(groups) {
            let group = &children[range];
            self.write_internal(page_id, group)?;
            level.push(Subtree {
                page_id,
                max_key: group.last().map(|c| c.max_key.clone()).unwrap_or_default(),
            });
        }
        Ok(level)
    }

    fn write_leaf(&self, page_id: PageId, keys: &[String], next: PageId) -> Result<()> {
        let mut writer = NodeWriter::leaf(next);
        for key in keys {
            writer.push_key(key.as_bytes());
        }
        let mut page = self.pool.fetch_page_mut(page_id)?;
        writer.write(page_id, &mut page)
    }

    /// Separators for all but the last child, which becomes the rightmost.
    fn write_internal(&self, page_id: PageId, children: &[Subtree]) -> Result<()> {
        let Some((last, rest)) = children.split_last() else {
            return Err(Error::InvalidConfig(format!(
                "internal {} would have no children",
                page_id
            )));
        };
        let mut writer = NodeWriter::internal(last.page_id);
        for child in rest {
            writer.push_separator(child.max_key.as_bytes(), child.page_id);
        }
        let mut page = self.pool.fetch_page_mut(page_id)?;
        writer.write(page_id, &mut page)
    }

    fn allocate(&self, count: usize) -> Result<Vec<PageId>> {
        (0..count)
            .map(|_| Ok(self.pool.new_page()?.page_id()))
            .collect()
    }
}

/// Levels, leaf level included, that `build` writes for `keys` distinct keys.
fn tree_height(keys: usize, leaf_capacity: usize, fanout: usize) -> usize {
    if keys <= leaf_capacity {
        return 1;
    }
    let mut level = keys.div_ceil(leaf_capacity);
    let mut height = 2;
    while level > fanout {
        level = level.div_ceil(fanout);
        height += 1;
    }
    height
}

/// Split `0..n` into the fewest runs of at most `cap`, sizes within one.
fn even_groups(n: usize, cap: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }
    let groups = n.div_ceil(cap);
    let base = n / groups;
    let extra = n % groups;

    let mut start = 0;
    (0..groups)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_groups() {
        assert!(even_groups(0, 3).is_empty());
        assert_eq!(even_groups(3, 3), vec![0..3]);
        assert_eq!(even_groups(4, 3), vec![0..2, 2..4]);
        assert_eq!(even_groups(7, 3), vec![0..3, 3..5, 5..7]);
        assert_eq!(even_groups(5, 1), vec![0..1, 1..2, 2..3, 3..4, 4..5]);
    }

    #[test]
    fn test_tree_height() {
        assert_eq!(tree_height(0, 4, 3), 1);
        assert_eq!(tree_height(4, 4, 3), 1);
        assert_eq!(tree_height(5, 4, 3), 2);
        assert_eq!(tree_height(12, 4, 3), 2);
        assert_eq!(tree_height(13, 4, 3), 3);
        assert_eq!(tree_height(36, 4, 3), 3);
        assert_eq!(tree_height(37, 4, 3), 4);
    }

    #[test]
    fn test_tree_height_limit_with_narrowest_nodes() {
        // One key per leaf and three children per internal node.
        let deepest = 3usize.pow(MAX_TREE_HEIGHT as u32 - 1);
        assert_eq!(tree_height(deepest, 1, 3), MAX_TREE_HEIGHT);
        assert_eq!(tree_height(deepest + 1, 1, 3), MAX_TREE_HEIGHT + 1);
        assert!(tree_height(usize::MAX, 62, 60) <= MAX_TREE_HEIGHT);
    }

    #[test]
    fn test_internal_groups_never_singletons() {
        for fanout in 3..8 {
            for n in (fanout + 1)..200 {
                for range in even_groups(n, fanout) {
                    assert!(range.len() >= 2, "n={} fanout={}", n, fanout);
                    assert!(range.len() <= fanout);
                }
            }
        }
    }
}
