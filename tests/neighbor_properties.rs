//! Property-based tests for neighbor search.
//!
//! Every tree shape the bulk loader can produce is checked against a
//! `BTreeSet` oracle holding the same normalized keys.

use std::collections::BTreeSet;

use proptest::prelude::*;
use tempfile::tempdir;
use wordtree::common::config::DEFAULT_STOP_WORDS;
use wordtree::{Error, IndexOptions, WordIndex};

// ============================================================================
//  Strategies
// ============================================================================

fn word() -> impl Strategy<Value = String> {
    "[a-z][a-z'-]{0,11}"
}

fn word_set(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(word(), 1..=max)
}

/// Leaf capacity and internal fanout small enough to force deep trees.
fn node_sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=8, 3usize..=6)
}

fn oracle(words: &[String]) -> Vec<String> {
    let set: BTreeSet<String> = words
        .iter()
        .filter(|w| !DEFAULT_STOP_WORDS.contains(&w.as_str()))
        .cloned()
        .collect();
    set.into_iter().collect()
}

fn build(words: &[String], (leaf, fanout): (usize, usize)) -> (WordIndex, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let options = IndexOptions::default()
        .with_leaf_capacity(leaf)
        .with_internal_fanout(fanout);
    let index = WordIndex::create(dir.path().join("p.idx"), words, options).unwrap();
    (index, dir)
}

// ============================================================================
//  Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn predecessors_match_oracle(
        words in word_set(200),
        sizes in node_sizes(),
        pick in any::<prop::sample::Index>(),
        k in 1usize..40,
    ) {
        let sorted = oracle(&words);
        prop_assume!(!sorted.is_empty());
        let (index, _dir) = build(&words, sizes);

        let i = pick.index(sorted.len());
        let got = index.find_predecessors(&sorted[i], k).unwrap();
        prop_assert_eq!(&got, &sorted[i.saturating_sub(k)..i].to_vec());
        prop_assert!(got.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(index.stats().outstanding(), 0);
    }

    #[test]
    fn successors_match_oracle(
        words in word_set(200),
        sizes in node_sizes(),
        pick in any::<prop::sample::Index>(),
        k in 1usize..40,
    ) {
        let sorted = oracle(&words);
        prop_assume!(!sorted.is_empty());
        let (index, _dir) = build(&words, sizes);

        let i = pick.index(sorted.len());
        let end = (i + 1 + k).min(sorted.len());
        let got = index.find_successors(&sorted[i], k).unwrap();
        prop_assert_eq!(&got, &sorted[i + 1..end].to_vec());
        prop_assert_eq!(index.stats().outstanding(), 0);
    }

    #[test]
    fn absent_words_are_not_found(
        words in word_set(100),
        probe in word(),
        sizes in node_sizes(),
    ) {
        let sorted = oracle(&words);
        prop_assume!(!sorted.is_empty());
        prop_assume!(!DEFAULT_STOP_WORDS.contains(&probe.as_str()));
        prop_assume!(sorted.binary_search(&probe).is_err());
        let (index, _dir) = build(&words, sizes);

        let is_not_found = matches!(index.find_predecessors(&probe, 3), Err(Error::KeyNotFound(_)));
        prop_assert!(is_not_found);
        let is_not_found = matches!(index.find_successors(&probe, 3), Err(Error::KeyNotFound(_)));
        prop_assert!(is_not_found);
    }

    #[test]
    fn searches_balance_fetches(
        words in word_set(150),
        sizes in node_sizes(),
        k in 1usize..60,
    ) {
        let sorted = oracle(&words);
        let (index, _dir) = build(&words, sizes);

        for word in sorted.iter().step_by(5) {
            let before = index.stats().snapshot();
            index.find_predecessors(word, k).unwrap();
            index.find_successors(word, k).unwrap();
            let delta = index.stats().snapshot().since(&before);
            prop_assert_eq!(delta.page_fetches, delta.page_releases);
        }
    }
}
