use imagesweep::duplicates::{group, DuplicatePair, PairStore};
use imagesweep::session::{SelectionTracker, SessionState};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

/// Pairs drawn from a small name pool so that repeats are common.
fn pairs_strategy() -> impl Strategy<Value = Vec<DuplicatePair>> {
    prop::collection::vec(("[a-f]", "[a-f]", 0.0f64..=1.0), 0..40).prop_map(|raw| {
        raw.into_iter()
            .map(|(o, d, s)| DuplicatePair::new(format!("/img/{o}.jpg"), format!("/img/{d}.png"), s))
            .collect()
    })
}

fn names_strategy() -> impl Strategy<Value = BTreeSet<PathBuf>> {
    prop::collection::btree_set("[a-f]\\.(jpg|png)", 0..6)
        .prop_map(|names| names.into_iter().map(|n| PathBuf::from(format!("/img/{n}"))).collect())
}

proptest! {
    #[test]
    fn test_grouping_has_no_repeated_paths(pairs in pairs_strategy()) {
        let grouping = group(&PairStore::from(pairs));

        let originals: HashSet<_> = grouping.originals.iter().collect();
        prop_assert_eq!(originals.len(), grouping.originals.len());

        let duplicates: HashSet<_> = grouping.duplicates.iter().map(|d| &d.path).collect();
        prop_assert_eq!(duplicates.len(), grouping.duplicates.len());
    }

    #[test]
    fn test_grouping_keeps_first_occurrence(pairs in pairs_strategy()) {
        let grouping = group(&PairStore::from(pairs.clone()));

        for entry in &grouping.duplicates {
            let first = pairs.iter().find(|p| p.duplicate_path == entry.path).unwrap();
            prop_assert_eq!(entry.similarity, first.similarity);
            prop_assert_eq!(&entry.original_path, &first.original_path);
        }

        let mut expected: Vec<PathBuf> = Vec::new();
        for pair in &pairs {
            if !expected.contains(&pair.original_path) {
                expected.push(pair.original_path.clone());
            }
        }
        prop_assert_eq!(&grouping.originals, &expected);
    }

    #[test]
    fn test_grouping_is_repeatable(pairs in pairs_strategy()) {
        let store = PairStore::from(pairs);
        prop_assert_eq!(group(&store), group(&store));
    }

    #[test]
    fn test_filtering_removes_every_touching_pair(
        pairs in pairs_strategy(),
        removed in names_strategy(),
    ) {
        let store = PairStore::from(pairs.clone());
        let kept = store.without_paths(&removed);

        for pair in kept.iter() {
            prop_assert!(!removed.contains(&pair.original_path));
            prop_assert!(!removed.contains(&pair.duplicate_path));
        }

        let expected: Vec<DuplicatePair> = pairs
            .into_iter()
            .filter(|p| !removed.contains(&p.original_path) && !removed.contains(&p.duplicate_path))
            .collect();
        prop_assert_eq!(kept.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_selection_stays_within_grouping(
        pairs in pairs_strategy(),
        picks in names_strategy(),
        removed in names_strategy(),
    ) {
        let mut state = SessionState::default();
        state.set_pairs(PairStore::from(pairs));

        for path in &picks {
            if state.grouping.has_original(path) {
                state.selection.originals.toggle(path);
            }
            if state.grouping.has_duplicate(path) {
                state.selection.duplicates.toggle(path);
            }
        }

        let filtered = state.pairs.without_paths(&removed);
        state.set_pairs(filtered);

        for path in state.selection.originals.paths() {
            prop_assert!(state.grouping.has_original(path));
        }
        for path in state.selection.duplicates.paths() {
            prop_assert!(state.grouping.has_duplicate(path));
        }
    }

    #[test]
    fn test_select_all_twice_restores_selection(pairs in pairs_strategy(), start_full in any::<bool>()) {
        let grouping = group(&PairStore::from(pairs));
        let paths = grouping.duplicate_paths();

        let mut tracker = SelectionTracker::new();
        if start_full {
            tracker.select_all(&paths);
        }
        let before = tracker.clone();

        tracker.select_all(&paths);
        tracker.select_all(&paths);

        prop_assert_eq!(tracker, before);
    }
}
