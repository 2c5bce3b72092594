//! Key ordering and in-node position search.
//!
//! Keys are compared byte-wise after ASCII case folding. Results use
//! [`std::cmp::Ordering`] and always describe the *query* relative to the
//! *stored* key: `Greater` means the query sorts after the stored key.

use std::cmp::Ordering;

use super::btree::KeyEntry;

/// Order `query` against `stored`, ignoring ASCII case.
///
/// # Example
/// ```
/// use std::cmp::Ordering;
/// use wordtree::index::compare_keys;
///
/// assert_eq!(compare_keys(b"Cat", b"cat"), Ordering::Equal);
/// assert_eq!(compare_keys(b"cat", b"catalog"), Ordering::Less);
/// assert_eq!(compare_keys(b"dog", b"cat"), Ordering::Greater);
/// ```
pub fn compare_keys(query: &[u8], stored: &[u8]) -> Ordering {
    query
        .iter()
        .map(u8::to_ascii_lowercase)
        .cmp(stored.iter().map(u8::to_ascii_lowercase))
}

/// Where `key` sits among a node's sorted entries.
///
/// Returns `(rank, found)`: `rank` is the number of entries strictly less
/// than `key` (0-based insertion point) and `found` is true when the entry
/// at `rank` equals `key`.
pub fn find_insertion_rank(entries: &[KeyEntry<'_>], key: &[u8]) -> (usize, bool) {
    match entries.binary_search_by(|entry| compare_keys(entry.key, key)) {
        Ok(rank) => (rank, true),
        Err(rank) => (rank, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_entries<'a>(keys: &[&'a str]) -> Vec<KeyEntry<'a>> {
        keys.iter()
            .map(|k| KeyEntry {
                key: k.as_bytes(),
                child: None,
            })
            .collect()
    }

    #[test]
    fn test_compare_is_case_insensitive() {
        assert_eq!(compare_keys(b"APPLE", b"apple"), Ordering::Equal);
        assert_eq!(compare_keys(b"Apple", b"banana"), Ordering::Less);
        assert_eq!(compare_keys(b"b", b"A"), Ordering::Greater);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(compare_keys(b"ant", b"antelope"), Ordering::Less);
        assert_eq!(compare_keys(b"antelope", b"ant"), Ordering::Greater);
        assert_eq!(compare_keys(b"", b"a"), Ordering::Less);
    }

    #[test]
    fn test_rank_of_present_key() {
        let entries = leaf_entries(&["cat", "dog", "fox"]);
        assert_eq!(find_insertion_rank(&entries, b"cat"), (0, true));
        assert_eq!(find_insertion_rank(&entries, b"dog"), (1, true));
        assert_eq!(find_insertion_rank(&entries, b"fox"), (2, true));
    }

    #[test]
    fn test_rank_of_absent_key() {
        let entries = leaf_entries(&["cat", "dog", "fox"]);
        assert_eq!(find_insertion_rank(&entries, b"ant"), (0, false));
        assert_eq!(find_insertion_rank(&entries, b"cow"), (1, false));
        assert_eq!(find_insertion_rank(&entries, b"zebra"), (3, false));
        assert_eq!(find_insertion_rank(&[], b"cat"), (0, false));
    }
}
