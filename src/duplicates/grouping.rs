//! Derivation of distinct originals and duplicates from a pair store.
//!
//! # Overview
//!
//! A scan reports a flat list of pairs. The same original usually appears in
//! several pairs, and the same duplicate can in principle be reported against
//! more than one original. [`group`] collapses that list into two
//! de-duplicated, independently addressable collections:
//!
//! - `originals`: distinct original paths, in first-occurrence order
//! - `duplicates`: distinct duplicate paths, each carrying the similarity and
//!   original of the **first** pair it appeared in
//!
//! Later pairs that reuse an already-seen duplicate path are ignored; scores
//! are never merged.
//!
//! # Example
//!
//! ```
//! use imagesweep::duplicates::{group, DuplicatePair, PairStore};
//! use std::path::PathBuf;
//!
//! let pairs = PairStore::from(vec![
//!     DuplicatePair::new("A", "B", 0.9),
//!     DuplicatePair::new("A", "C", 0.8),
//!     DuplicatePair::new("X", "B", 0.6),
//! ]);
//!
//! let grouping = group(&pairs);
//! assert_eq!(grouping.originals, vec![PathBuf::from("A"), PathBuf::from("X")]);
//! assert_eq!(grouping.duplicates.len(), 2);
//! assert_eq!(grouping.duplicates[0].original_path, PathBuf::from("A"));
//! assert_eq!(grouping.duplicates[0].similarity, 0.9);
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::pair::{display_name, PairStore};

/// A distinct duplicate path with the metadata of its first finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateEntry {
    /// The duplicate image.
    pub path: PathBuf,
    /// Similarity captured from the first pair naming this duplicate.
    pub similarity: f64,
    /// Original captured from the first pair naming this duplicate.
    pub original_path: PathBuf,
}

impl DuplicateEntry {
    /// Display name of the duplicate (last path segment).
    #[must_use]
    pub fn name(&self) -> String {
        display_name(&self.path)
    }

    /// Display name of the original it was matched against.
    #[must_use]
    pub fn original_name(&self) -> String {
        display_name(&self.original_path)
    }
}

/// De-duplicated view of a pair store. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Grouping {
    /// Distinct original paths in first-occurrence order.
    pub originals: Vec<PathBuf>,
    /// Distinct duplicate paths in first-occurrence order.
    pub duplicates: Vec<DuplicateEntry>,
}

impl Grouping {
    /// Check if there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.originals.is_empty() && self.duplicates.is_empty()
    }

    /// Paths of all duplicates, in display order.
    #[must_use]
    pub fn duplicate_paths(&self) -> Vec<PathBuf> {
        self.duplicates.iter().map(|d| d.path.clone()).collect()
    }

    /// Check whether `path` is one of the originals.
    #[must_use]
    pub fn has_original(&self, path: &Path) -> bool {
        self.originals.iter().any(|p| p == path)
    }

    /// Check whether `path` is one of the duplicates.
    #[must_use]
    pub fn has_duplicate(&self, path: &Path) -> bool {
        self.duplicates.iter().any(|d| d.path == path)
    }

    /// Look up the duplicate entry for `path`.
    #[must_use]
    pub fn duplicate(&self, path: &Path) -> Option<&DuplicateEntry> {
        self.duplicates.iter().find(|d| d.path == path)
    }
}

/// Group a pair store into distinct originals and duplicates.
///
/// Pure and deterministic: O(n) in the number of pairs, using one membership
/// set per collection. Empty input yields an empty [`Grouping`].
#[must_use]
pub fn group(pairs: &PairStore) -> Grouping {
    let mut grouping = Grouping::default();
    let mut seen_originals: HashSet<&Path> = HashSet::new();
    let mut seen_duplicates: HashSet<&Path> = HashSet::new();

    for pair in pairs {
        if seen_originals.insert(pair.original_path.as_path()) {
            grouping.originals.push(pair.original_path.clone());
        }

        if seen_duplicates.insert(pair.duplicate_path.as_path()) {
            grouping.duplicates.push(DuplicateEntry {
                path: pair.duplicate_path.clone(),
                similarity: pair.similarity,
                original_path: pair.original_path.clone(),
            });
        } else {
            log::trace!(
                "Ignoring repeat duplicate {} (already matched)",
                pair.duplicate_path.display()
            );
        }
    }

    log::debug!(
        "Grouped {} pairs into {} originals and {} duplicates",
        pairs.len(),
        grouping.originals.len(),
        grouping.duplicates.len()
    );

    grouping
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::DuplicatePair;

    #[test]
    fn test_group_empty() {
        let grouping = group(&PairStore::new());
        assert!(grouping.originals.is_empty());
        assert!(grouping.duplicates.is_empty());
        assert!(grouping.is_empty());
    }

    #[test]
    fn test_group_first_occurrence_wins() {
        let pairs = PairStore::from(vec![
            DuplicatePair::new("A", "B", 0.9),
            DuplicatePair::new("A", "C", 0.8),
            DuplicatePair::new("X", "B", 0.6),
        ]);

        let grouping = group(&pairs);

        assert_eq!(grouping.originals, vec![PathBuf::from("A"), PathBuf::from("X")]);
        assert_eq!(grouping.duplicate_paths(), vec![PathBuf::from("B"), PathBuf::from("C")]);

        let b = grouping.duplicate(Path::new("B")).unwrap();
        assert_eq!(b.similarity, 0.9);
        assert_eq!(b.original_path, PathBuf::from("A"));
    }

    #[test]
    fn test_group_path_can_be_both_original_and_duplicate() {
        let pairs = PairStore::from(vec![
            DuplicatePair::new("A", "B", 0.9),
            DuplicatePair::new("B", "C", 0.7),
        ]);

        let grouping = group(&pairs);
        assert!(grouping.has_original(Path::new("B")));
        assert!(grouping.has_duplicate(Path::new("B")));
        assert!(!grouping.has_original(Path::new("C")));
    }

    #[test]
    fn test_group_is_repeatable() {
        let pairs = PairStore::from(vec![
            DuplicatePair::new("A", "B", 0.9),
            DuplicatePair::new("C", "D", 0.5),
        ]);
        assert_eq!(group(&pairs), group(&pairs));
    }

    #[test]
    fn test_entry_names() {
        let entry = DuplicateEntry {
            path: PathBuf::from("/photos/b.jpg"),
            similarity: 0.75,
            original_path: PathBuf::from("/photos/a.jpg"),
        };
        assert_eq!(entry.name(), "b.jpg");
        assert_eq!(entry.original_name(), "a.jpg");
    }
}
