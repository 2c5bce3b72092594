//! Index structures.
//!
//! - [`WordIndex`] - validated predecessor/successor queries over a file
//! - [`btree`] - the B+ tree, its page layout and neighbor search
//! - [`key`] - key ordering and in-node rank search
//! - [`normalize`] - request key validation

pub mod btree;
pub mod key;
pub mod normalize;
mod word_index;

pub use key::{compare_keys, find_insertion_rank};
pub use normalize::KeyNormalizer;
pub use word_index::WordIndex;
