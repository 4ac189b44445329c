//! Selection state over the originals and duplicates lists.
//!
//! # Overview
//!
//! Two independent [`SelectionTracker`]s make up a [`SelectionState`]: one
//! over the distinct originals, one over the distinct duplicates. Callers only
//! offer paths drawn from the current grouping; when the grouping is
//! recomputed, [`SelectionState::retain_grouping`] drops anything that is no
//! longer present.
//!
//! "Select all" is a symmetric toggle: when everything is already selected it
//! clears the selection instead.
//!
//! # Example
//!
//! ```
//! use imagesweep::session::SelectionTracker;
//! use std::path::PathBuf;
//!
//! let all = vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")];
//! let mut tracker = SelectionTracker::new();
//!
//! tracker.select_all(&all);
//! assert_eq!(tracker.len(), 2);
//!
//! tracker.select_all(&all);
//! assert!(tracker.is_empty());
//! ```

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::duplicates::Grouping;

/// A set of selected paths over one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: BTreeSet<PathBuf>,
}

impl SelectionTracker {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle `path`: insert it if absent, remove it if present.
    ///
    /// `path` must come from the current grouping; this is not re-validated
    /// here. Returns whether the path is selected afterwards.
    pub fn toggle(&mut self, path: &Path) -> bool {
        if self.selected.remove(path) {
            log::debug!("Deselected: {}", path.display());
            false
        } else {
            self.selected.insert(path.to_path_buf());
            log::debug!("Selected: {}", path.display());
            true
        }
    }

    /// Select everything in `grouping_paths`, or clear if that is already the
    /// selection size.
    pub fn select_all(&mut self, grouping_paths: &[PathBuf]) {
        if self.selected.len() == grouping_paths.len() {
            let count = self.selected.len();
            self.selected.clear();
            log::debug!("Deselected all {} paths", count);
        } else {
            self.selected = grouping_paths.iter().cloned().collect();
            log::debug!("Selected all {} paths", self.selected.len());
        }
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop every selected path not contained in `present`.
    pub fn retain(&mut self, present: &HashSet<&Path>) {
        let before = self.selected.len();
        self.selected.retain(|p| present.contains(p.as_path()));
        let dropped = before - self.selected.len();
        if dropped > 0 {
            log::debug!("Dropped {} stale selection(s)", dropped);
        }
    }

    /// Check if `path` is selected.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.selected.contains(path)
    }

    /// Number of selected paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Check if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Borrow the selected paths (sorted).
    #[must_use]
    pub fn paths(&self) -> &BTreeSet<PathBuf> {
        &self.selected
    }
}

/// Selections over both lists of a grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Selected originals.
    pub originals: SelectionTracker,
    /// Selected duplicates.
    pub duplicates: SelectionTracker,
}

impl SelectionState {
    /// Clear both selections.
    pub fn clear(&mut self) {
        self.originals.clear();
        self.duplicates.clear();
    }

    /// Scope both selections to the paths present in `grouping`.
    pub fn retain_grouping(&mut self, grouping: &Grouping) {
        let originals: HashSet<&Path> = grouping.originals.iter().map(PathBuf::as_path).collect();
        let duplicates: HashSet<&Path> = grouping
            .duplicates
            .iter()
            .map(|d| d.path.as_path())
            .collect();

        self.originals.retain(&originals);
        self.duplicates.retain(&duplicates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::{group, DuplicatePair, PairStore};

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_toggle() {
        let mut tracker = SelectionTracker::new();
        assert!(tracker.toggle(Path::new("a")));
        assert!(tracker.contains(Path::new("a")));
        assert!(!tracker.toggle(Path::new("a")));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_select_all_from_partial() {
        let all = paths(&["a", "b", "c"]);
        let mut tracker = SelectionTracker::new();
        tracker.toggle(Path::new("b"));

        tracker.select_all(&all);
        assert_eq!(tracker.len(), 3);

        tracker.select_all(&all);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_select_all_on_empty_grouping_is_noop() {
        let mut tracker = SelectionTracker::new();
        tracker.select_all(&[]);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_retain_grouping_drops_absent_paths() {
        let grouping = group(&PairStore::from(vec![DuplicatePair::new("A", "B", 0.9)]));

        let mut state = SelectionState::default();
        state.originals.toggle(Path::new("A"));
        state.originals.toggle(Path::new("gone"));
        state.duplicates.toggle(Path::new("B"));
        state.duplicates.toggle(Path::new("A"));

        state.retain_grouping(&grouping);

        assert_eq!(state.originals.paths().len(), 1);
        assert!(state.originals.contains(Path::new("A")));
        assert_eq!(state.duplicates.paths().len(), 1);
        assert!(state.duplicates.contains(Path::new("B")));
    }

    #[test]
    fn test_clear_both() {
        let mut state = SelectionState::default();
        state.originals.toggle(Path::new("A"));
        state.duplicates.toggle(Path::new("B"));
        state.clear();
        assert!(state.originals.is_empty());
        assert!(state.duplicates.is_empty());
    }
}
