//! Deletion against the delete service, and reconciliation of session state.
//!
//! # Overview
//!
//! A deletion is split into two halves so that nothing is mutated unless the
//! service call succeeds:
//!
//! 1. [`DeletionReconciler::request`] validates the request and calls the
//!    delete service. A failure here leaves the session untouched.
//! 2. [`DeletionReconciler::apply`] commits the outcome: it filters the pair
//!    store, re-derives the grouping, clears selections, marks the scan as
//!    completed, and raises the completion dialog when little is left.
//!
//! # Policy
//!
//! The service reports aggregate counts. With [`DeletionPolicy::Optimistic`]
//! every requested path is treated as gone even if the service reported
//! failures, so an image that persistently fails to delete is not offered
//! again. [`DeletionPolicy::KeepFailed`] keeps pairs touching a path the
//! service listed in `failed_paths`.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::state::{SessionPhase, SessionState};
use crate::error::SessionError;
use crate::services::{DeleteReport, DeleteService};

/// Default for the completion threshold: a delete that leaves this many pairs
/// or fewer ends the review.
pub const COMPLETION_MAX_REMAINING_PAIRS: usize = 1;

/// How requested paths are removed from the pair store after a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletionPolicy {
    /// Remove every requested path, whatever the service reported.
    #[default]
    Optimistic,
    /// Keep paths the service reported as failed.
    KeepFailed,
}

impl std::str::FromStr for DeletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(Self::Optimistic),
            "keep-failed" | "keep_failed" => Ok(Self::KeepFailed),
            other => Err(format!(
                "Unknown deletion policy: '{other}' (expected optimistic or keep-failed)"
            )),
        }
    }
}

/// Outcome of a committed deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionResult {
    /// Paths that were requested.
    pub requested: BTreeSet<PathBuf>,
    /// Files the service removed.
    pub deleted_count: usize,
    /// Files the service could not remove.
    pub failed_count: usize,
    /// Failed paths, when the service named them.
    pub failed_paths: Vec<PathBuf>,
    /// Pairs left in the store.
    pub remaining_pairs: usize,
    /// Whether this deletion raised the completion dialog.
    pub completion_reached: bool,
}

impl DeletionResult {
    /// Message for the user, e.g. "3 image(s) deleted successfully. 1 failed."
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} image(s) deleted successfully. {} failed.",
            self.deleted_count, self.failed_count
        )
    }

    /// Check whether the service reported any failure.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed_count > 0
    }
}

/// Runs deletions against a [`DeleteService`] and reconciles session state.
#[derive(Clone)]
pub struct DeletionReconciler {
    service: Arc<dyn DeleteService>,
    policy: DeletionPolicy,
    completion_max_remaining_pairs: usize,
}

impl std::fmt::Debug for DeletionReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeletionReconciler")
            .field("policy", &self.policy)
            .field(
                "completion_max_remaining_pairs",
                &self.completion_max_remaining_pairs,
            )
            .finish_non_exhaustive()
    }
}

impl DeletionReconciler {
    /// Create a reconciler with the default policy and completion threshold.
    #[must_use]
    pub fn new(service: Arc<dyn DeleteService>) -> Self {
        Self {
            service,
            policy: DeletionPolicy::default(),
            completion_max_remaining_pairs: COMPLETION_MAX_REMAINING_PAIRS,
        }
    }

    /// Set the deletion policy.
    #[must_use]
    pub fn with_policy(mut self, policy: DeletionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set how many remaining pairs still count as "nothing left".
    #[must_use]
    pub fn with_completion_threshold(mut self, max_remaining_pairs: usize) -> Self {
        self.completion_max_remaining_pairs = max_remaining_pairs;
        self
    }

    /// The deletion policy in use.
    #[must_use]
    pub fn policy(&self) -> DeletionPolicy {
        self.policy
    }

    /// Validate `paths` and call the delete service. Mutates nothing.
    ///
    /// # Errors
    ///
    /// - `EmptySelection` if `paths` is empty (no service call is made)
    /// - `DeleteServiceUnavailable` if the service call fails
    pub async fn request(&self, paths: &BTreeSet<PathBuf>) -> Result<DeleteReport, SessionError> {
        if paths.is_empty() {
            return Err(SessionError::EmptySelection);
        }

        log::info!("Requesting deletion of {} image(s)", paths.len());

        self.service.delete(paths).await.map_err(|e| {
            log::error!("Delete service failed: {}", e);
            SessionError::DeleteServiceUnavailable {
                message: e.to_string(),
            }
        })
    }

    /// Commit a successful service response to `state`.
    pub fn apply(
        &self,
        state: &mut SessionState,
        requested: BTreeSet<PathBuf>,
        report: DeleteReport,
    ) -> DeletionResult {
        let removed: BTreeSet<PathBuf> = match self.policy {
            DeletionPolicy::Optimistic => requested.clone(),
            DeletionPolicy::KeepFailed => {
                let failed: BTreeSet<&PathBuf> = report.failed_paths.iter().collect();
                requested
                    .iter()
                    .filter(|p| !failed.contains(p))
                    .cloned()
                    .collect()
            }
        };

        let remaining = state.pairs.without_paths(&removed);
        state.set_pairs(remaining);
        state.selection.clear();
        state.scan_completed = true;

        let completion_reached = state.grouping.is_empty()
            || state.pairs.len() <= self.completion_max_remaining_pairs;
        if completion_reached {
            state.completion_dialog_visible = true;
            if state.phase != SessionPhase::Exhausted {
                log::debug!("Phase transition: {:?} -> Exhausted", state.phase);
            }
            state.phase = SessionPhase::Exhausted;
        }

        let result = DeletionResult {
            requested,
            deleted_count: report.deleted,
            failed_count: report.failed,
            failed_paths: report.failed_paths,
            remaining_pairs: state.pairs.len(),
            completion_reached,
        };

        log::info!(
            "{} {} pair(s) remaining",
            result.summary(),
            result.remaining_pairs
        );

        result
    }

    /// Delete `paths` and reconcile `state` in one step.
    ///
    /// # Errors
    ///
    /// See [`DeletionReconciler::request`]; on error `state` is unchanged.
    pub async fn delete_selected(
        &self,
        state: &mut SessionState,
        paths: BTreeSet<PathBuf>,
    ) -> Result<DeletionResult, SessionError> {
        let report = self.request(&paths).await?;
        Ok(self.apply(state, paths, report))
    }
}
