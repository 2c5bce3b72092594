//! Request-side key validation.

use std::collections::HashSet;

use crate::common::config::IndexOptions;
use crate::common::{Error, Result};

/// Turns raw user input into the canonical form stored in the tree, or
/// rejects it before any page is touched.
///
/// Accepted keys are trimmed, lowercased, at most `max_key_len` bytes,
/// made of ASCII letters, digits, `-` and `'`, and not stop words.
#[derive(Debug, Clone)]
pub struct KeyNormalizer {
    max_key_len: usize,
    stop_words: HashSet<String>,
}

impl KeyNormalizer {
    pub fn new(max_key_len: usize, stop_words: HashSet<String>) -> Self {
        Self {
            max_key_len,
            stop_words: stop_words
                .into_iter()
                .map(|w| w.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_options(options: &IndexOptions) -> Self {
        Self::new(options.max_key_len, options.stop_words.clone())
    }

    /// Canonical form of `raw`.
    ///
    /// # Errors
    /// - `Error::MalformedKey` for empty input or disallowed characters
    /// - `Error::KeyTooLong` past `max_key_len` bytes
    /// - `Error::StopWord` for stop words
    pub fn normalize(&self, raw: &str) -> Result<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::MalformedKey(raw.to_string()));
        }
        if trimmed.len() > self.max_key_len {
            return Err(Error::KeyTooLong {
                len: trimmed.len(),
                max: self.max_key_len,
            });
        }

        let key = trimmed.to_ascii_lowercase();
        if !key.bytes().all(is_key_byte) {
            return Err(Error::MalformedKey(raw.to_string()));
        }
        if self.stop_words.contains(&key) {
            return Err(Error::StopWord(key));
        }
        Ok(key)
    }
}

fn is_key_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'\''
}
