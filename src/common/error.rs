//! Error types for wordtree.

use thiserror::Error;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in wordtree.
///
/// The variants fall into four groups that callers are expected to tell
/// apart:
/// - rejected requests (`InvalidK`, `KeyTooLong`, `StopWord`, `MalformedKey`):
///   no page was touched
/// - `KeyNotFound`: the key passed validation but is not stored in the tree
/// - structural damage (`Corruption`, `PageNotFound`, `NodeOverflow`)
/// - environment failures (`Io`, `NoFreeFrames`, `InvalidConfig`)
///
/// A short neighbor list is never an error.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist on disk.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// Buffer pool has no free frames and cannot evict any pages.
    ///
    /// This happens when all frames are pinned.
    #[error("No free frames available in buffer pool")]
    NoFreeFrames,

    /// The neighbor count must be positive.
    #[error("k must be positive")]
    InvalidK,

    /// Key is longer than the index accepts.
    #[error("key length {len} exceeds maximum of {max} bytes")]
    KeyTooLong { len: usize, max: usize },

    /// Key is a stop word and is never indexed.
    #[error("\"{0}\" is a common word - no searching is done")]
    StopWord(String),

    /// Key is empty or contains characters the index never stores.
    #[error("malformed key: \"{0}\"")]
    MalformedKey(String),

    /// Key is valid but not present in any leaf.
    #[error("key \"{0}\" not found")]
    KeyNotFound(String),

    /// The tree structure on disk violates a B+ tree invariant.
    #[error("corrupt index: {0}")]
    Corruption(String),

    /// Entries do not fit in a single page.
    #[error("node for page {0} does not fit in a page")]
    NodeOverflow(u32),

    /// Options that cannot produce a well-formed tree.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for requests rejected before any tree access.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Error::InvalidK | Error::KeyTooLong { .. } | Error::StopWord(_) | Error::MalformedKey(_)
        )
    }

    /// True when the on-disk tree is malformed.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_) | Error::PageNotFound(_))
    }

    pub(crate) fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(42);
        assert_eq!(format!("{}", err), "Page 42 not found");

        let err = Error::KeyNotFound("zebra".into());
        assert_eq!(format!("{}", err), "key \"zebra\" not found");

        let err = Error::KeyTooLong { len: 70, max: 64 };
        assert_eq!(
            format!("{}", err),
            "key length 70 exceeds maximum of 64 bytes"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_classes_are_disjoint() {
        assert!(Error::InvalidK.is_invalid_request());
        assert!(Error::StopWord("the".into()).is_invalid_request());
        assert!(!Error::KeyNotFound("cat".into()).is_invalid_request());
        assert!(!Error::KeyNotFound("cat".into()).is_corruption());
        assert!(Error::corruption("empty internal page").is_corruption());
        assert!(!Error::NoFreeFrames.is_corruption());
    }
}
