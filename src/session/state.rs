//! Session state and its presentation snapshot.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::selection::SelectionState;
use crate::duplicates::{display_name, group, DuplicatePair, Grouping, PairStore};

/// Coarse session lifecycle.
///
/// `Idle -> Scanning -> Populated -> (delete)* -> Exhausted -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Nothing scanned yet.
    #[default]
    Idle,
    /// A scan is outstanding.
    Scanning,
    /// Scan results are available for review.
    Populated,
    /// Deletions have left nothing worth reviewing.
    Exhausted,
}

/// A service call that may be outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Scan service call.
    Scan,
    /// Delete service call.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan => write!(f, "scan"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Everything the session knows. `grouping` and `selection` are always derived
/// from `pairs`.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Current findings.
    pub pairs: PairStore,
    /// Derived view of `pairs`.
    pub grouping: Grouping,
    /// User selections, scoped to `grouping`.
    pub selection: SelectionState,
    /// Set once at least one delete has succeeded.
    pub scan_completed: bool,
    /// Set when a delete leaves nothing worth reviewing.
    pub completion_dialog_visible: bool,
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Outstanding service call, if any.
    pub in_flight: Option<Operation>,
    /// Folder and threshold of the last successful scan.
    pub last_scan: Option<ScanRecord>,
    /// Incremented on every reset; results for older generations are dropped.
    pub generation: u64,
}

/// What the last successful scan looked at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRecord {
    /// Folder that was scanned.
    pub folder: PathBuf,
    /// Similarity threshold used.
    pub threshold: f64,
    /// When the results arrived.
    pub scanned_at: DateTime<Utc>,
}

impl SessionState {
    /// Replace the pair store and re-derive grouping and selections.
    pub fn set_pairs(&mut self, pairs: PairStore) {
        self.grouping = group(&pairs);
        self.pairs = pairs;
        self.selection.retain_grouping(&self.grouping);
    }

    /// Check whether a scan has ever produced results in this session.
    #[must_use]
    pub fn has_scanned(&self) -> bool {
        self.last_scan.is_some()
    }

    /// Build a presentation snapshot.
    #[must_use]
    pub fn view(&self) -> SessionView {
        let originals = self
            .grouping
            .originals
            .iter()
            .map(|path| OriginalView {
                name: display_name(path),
                path: path.clone(),
                selected: self.selection.originals.contains(path),
            })
            .collect();

        let duplicates = self
            .grouping
            .duplicates
            .iter()
            .map(|entry| DuplicateView {
                name: entry.name(),
                path: entry.path.clone(),
                similarity: entry.similarity,
                original_name: entry.original_name(),
                original_path: entry.original_path.clone(),
                selected: self.selection.duplicates.contains(&entry.path),
            })
            .collect();

        SessionView {
            status: self.status(),
            phase: self.phase,
            in_flight: self.in_flight,
            scan: self.last_scan.clone(),
            pair_count: self.pairs.len(),
            originals,
            duplicates,
            scan_completed: self.scan_completed,
            completion_dialog_visible: self.completion_dialog_visible,
        }
    }

    /// What the presentation layer should show.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        if self.completion_dialog_visible {
            SessionStatus::Completed
        } else if !self.has_scanned() {
            SessionStatus::NotScanned
        } else if self.grouping.is_empty() {
            SessionStatus::NoDuplicatesFound
        } else {
            SessionStatus::Reviewing
        }
    }

    /// Current findings as a slice.
    #[must_use]
    pub fn pairs(&self) -> &[DuplicatePair] {
        self.pairs.as_slice()
    }
}

/// Which screen the presentation layer should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No scan has run yet.
    NotScanned,
    /// A scan ran and found nothing (or deletions emptied the list while the
    /// completion dialog is dismissed).
    NoDuplicatesFound,
    /// Results are available.
    Reviewing,
    /// Processing completed; offer a new scan.
    Completed,
}

/// One original in the presentation snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginalView {
    /// Full path.
    pub path: PathBuf,
    /// Last path segment.
    pub name: String,
    /// Whether it is selected.
    pub selected: bool,
}

/// One duplicate in the presentation snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateView {
    /// Full path.
    pub path: PathBuf,
    /// Last path segment.
    pub name: String,
    /// Similarity to its original.
    pub similarity: f64,
    /// Full path of the original.
    pub original_path: PathBuf,
    /// Last path segment of the original.
    pub original_name: String,
    /// Whether it is selected.
    pub selected: bool,
}

/// Serializable snapshot of a session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    /// Which screen to show.
    pub status: SessionStatus,
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Outstanding service call; triggers should be disabled while set.
    pub in_flight: Option<Operation>,
    /// Last successful scan.
    pub scan: Option<ScanRecord>,
    /// Number of findings behind the lists.
    pub pair_count: usize,
    /// Distinct originals.
    pub originals: Vec<OriginalView>,
    /// Distinct duplicates.
    pub duplicates: Vec<DuplicateView>,
    /// At least one delete has succeeded.
    pub scan_completed: bool,
    /// Show the "Processing completed!" dialog.
    pub completion_dialog_visible: bool,
}

impl SessionView {
    /// Number of selected originals.
    #[must_use]
    pub fn selected_original_count(&self) -> usize {
        self.originals.iter().filter(|o| o.selected).count()
    }

    /// Number of selected duplicates.
    #[must_use]
    pub fn selected_duplicate_count(&self) -> usize {
        self.duplicates.iter().filter(|d| d.selected).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_state_is_idle_and_not_scanned() {
        let state = SessionState::default();
        assert_eq!(state.phase, SessionPhase::Idle);
        assert_eq!(state.status(), SessionStatus::NotScanned);
        assert!(state.grouping.is_empty());
        assert!(state.in_flight.is_none());
    }

    #[test]
    fn test_set_pairs_rederives_and_scopes_selection() {
        let mut state = SessionState::default();
        state.set_pairs(PairStore::from(vec![
            DuplicatePair::new("A", "B", 0.9),
            DuplicatePair::new("X", "Y", 0.7),
        ]));
        state.selection.originals.toggle(Path::new("X"));
        state.selection.duplicates.toggle(Path::new("Y"));

        state.set_pairs(PairStore::from(vec![DuplicatePair::new("A", "B", 0.9)]));

        assert_eq!(state.grouping.originals, vec![PathBuf::from("A")]);
        assert!(state.selection.originals.is_empty());
        assert!(state.selection.duplicates.is_empty());
    }

    #[test]
    fn test_view_marks_selected_entries() {
        let mut state = SessionState::default();
        state.set_pairs(PairStore::from(vec![DuplicatePair::new(
            "/p/a.jpg", "/p/b.jpg", 0.8,
        )]));
        state.selection.duplicates.toggle(Path::new("/p/b.jpg"));

        let view = state.view();
        assert_eq!(view.originals[0].name, "a.jpg");
        assert!(!view.originals[0].selected);
        assert_eq!(view.duplicates[0].name, "b.jpg");
        assert_eq!(view.duplicates[0].original_name, "a.jpg");
        assert!(view.duplicates[0].selected);
        assert_eq!(view.selected_duplicate_count(), 1);
        assert_eq!(view.selected_original_count(), 0);
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Scan.to_string(), "scan");
        assert_eq!(Operation::Delete.to_string(), "delete");
    }
}
