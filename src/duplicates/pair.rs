//! Pairwise similarity findings.
//!
//! A [`PairStore`] is the single source of truth for a session: it is replaced
//! wholesale after a scan and shrunk after a deletion. Everything shown to the
//! user is derived from it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One finding reported by a scan: `duplicate_path` resembles `original_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// The reference image.
    pub original_path: PathBuf,
    /// The image judged similar to `original_path`.
    pub duplicate_path: PathBuf,
    /// Similarity score in `[0, 1]`, higher is more similar.
    pub similarity: f64,
}

impl DuplicatePair {
    /// Create a new pair.
    #[must_use]
    pub fn new(
        original_path: impl Into<PathBuf>,
        duplicate_path: impl Into<PathBuf>,
        similarity: f64,
    ) -> Self {
        Self {
            original_path: original_path.into(),
            duplicate_path: duplicate_path.into(),
            similarity,
        }
    }

    /// Check whether either side of this pair is in `paths`.
    #[must_use]
    pub fn touches(&self, paths: &BTreeSet<PathBuf>) -> bool {
        paths.contains(&self.original_path) || paths.contains(&self.duplicate_path)
    }
}

/// Ordered sequence of findings, in the order the scan service reported them.
///
/// Order matters: it decides which pair wins when a duplicate path appears
/// more than once (see [`crate::duplicates::group`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairStore {
    pairs: Vec<DuplicatePair>,
}

impl PairStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pairs in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if the store holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over the pairs in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, DuplicatePair> {
        self.pairs.iter()
    }

    /// Borrow the pairs as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[DuplicatePair] {
        &self.pairs
    }

    /// Return a new store without any pair that touches one of `removed`.
    ///
    /// Relative order of the surviving pairs is preserved.
    #[must_use]
    pub fn without_paths(&self, removed: &BTreeSet<PathBuf>) -> Self {
        let pairs: Vec<DuplicatePair> = self
            .pairs
            .iter()
            .filter(|pair| !pair.touches(removed))
            .cloned()
            .collect();

        log::trace!(
            "Filtered pair store: {} -> {} pairs ({} paths removed)",
            self.pairs.len(),
            pairs.len(),
            removed.len()
        );

        Self { pairs }
    }
}

impl From<Vec<DuplicatePair>> for PairStore {
    fn from(pairs: Vec<DuplicatePair>) -> Self {
        Self { pairs }
    }
}

impl FromIterator<DuplicatePair> for PairStore {
    fn from_iter<I: IntoIterator<Item = DuplicatePair>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PairStore {
    type Item = &'a DuplicatePair;
    type IntoIter = std::slice::Iter<'a, DuplicatePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

/// Display name for an image path: its last path segment.
///
/// Falls back to the whole path when there is no final segment (e.g. `/`).
#[must_use]
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
