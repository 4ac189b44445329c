//! Integration tests for grouping and pair filtering.

use imagesweep::duplicates::{group, DuplicatePair, PairStore};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

fn store(pairs: &[(&str, &str, f64)]) -> PairStore {
    pairs
        .iter()
        .map(|&(o, d, s)| DuplicatePair::new(o, d, s))
        .collect()
}

fn removed(paths: &[&str]) -> BTreeSet<PathBuf> {
    paths.iter().map(PathBuf::from).collect()
}

#[test]
fn test_repeated_duplicate_keeps_first_match() {
    let grouping = group(&store(&[("A", "B", 0.9), ("A", "C", 0.8), ("X", "B", 0.6)]));

    assert_eq!(grouping.originals, vec![PathBuf::from("A"), PathBuf::from("X")]);
    assert_eq!(grouping.duplicates.len(), 2);

    let b = grouping.duplicate(Path::new("B")).unwrap();
    assert_eq!(b.similarity, 0.9);
    assert_eq!(b.original_path, PathBuf::from("A"));
}

#[test]
fn test_empty_store_groups_to_nothing() {
    let grouping = group(&PairStore::new());
    assert!(grouping.originals.is_empty());
    assert!(grouping.duplicates.is_empty());
    assert!(grouping.is_empty());
}

#[test]
fn test_path_can_be_original_and_duplicate() {
    let grouping = group(&store(&[("A", "B", 0.9), ("B", "C", 0.8)]));

    assert!(grouping.has_original(Path::new("B")));
    assert!(grouping.has_duplicate(Path::new("B")));
    assert_eq!(
        grouping.duplicate_paths(),
        vec![PathBuf::from("B"), PathBuf::from("C")]
    );
}

#[test]
fn test_deleting_duplicate_drops_its_pair() {
    let pairs = store(&[("A", "B", 0.9), ("A", "C", 0.8), ("X", "Y", 0.7)]);
    let remaining = pairs.without_paths(&removed(&["B"]));

    assert_eq!(
        remaining.as_slice(),
        store(&[("A", "C", 0.8), ("X", "Y", 0.7)]).as_slice()
    );
}

#[test]
fn test_deleting_original_drops_all_its_pairs() {
    let pairs = store(&[("A", "B", 0.9), ("A", "C", 0.8), ("X", "Y", 0.7)]);
    let remaining = pairs.without_paths(&removed(&["A"]));

    assert_eq!(remaining.as_slice(), store(&[("X", "Y", 0.7)]).as_slice());

    let grouping = group(&remaining);
    assert_eq!(grouping.originals, vec![PathBuf::from("X")]);
    assert_eq!(grouping.duplicate_paths(), vec![PathBuf::from("Y")]);
}

#[test]
fn test_display_names_use_last_segment() {
    let grouping = group(&store(&[("/photos/2024/a.jpg", "/photos/2024/a copy.jpg", 0.97)]));
    let entry = &grouping.duplicates[0];

    assert_eq!(entry.name(), "a copy.jpg");
    assert_eq!(entry.original_name(), "a.jpg");
}

#[test]
fn test_pair_store_serializes_as_plain_list() {
    let pairs = store(&[("A", "B", 0.5)]);
    let json = serde_json::to_value(&pairs).unwrap();

    assert!(json.is_array());
    assert_eq!(json[0]["original_path"], "A");
    assert_eq!(json[0]["duplicate_path"], "B");

    let back: PairStore = serde_json::from_value(json).unwrap();
    assert_eq!(back, pairs);
}
