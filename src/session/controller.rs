//! Top-level orchestration of a scan session.
//!
//! # Overview
//!
//! [`ScanSessionController`] owns one [`SessionState`] and drives it through
//!
//! ```text
//! Idle -> Scanning -> Populated -> (Populated via delete)* -> Exhausted
//!   ^                                                            |
//!   +------------------------ request_new_scan ------------------+
//! ```
//!
//! All methods take `&self`; the state sits behind a mutex that is never held
//! across a service call. While a scan or delete is outstanding the session
//! reports it through [`SessionView::in_flight`] and refuses a second scan or
//! delete with [`SessionError::OperationInFlight`]. Service results are
//! committed in one step after the call returns, so a failed call leaves the
//! session exactly as it was.
//!
//! # Example
//!
//! ```no_run
//! use imagesweep::services::{LocalDeleteService, LocalScanService};
//! use imagesweep::session::ScanSessionController;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), imagesweep::error::SessionError> {
//! let session = ScanSessionController::new(
//!     Arc::new(LocalScanService::default()),
//!     Arc::new(LocalDeleteService::default()),
//! );
//!
//! session.start_scan(Path::new("photos"), 0.9).await?;
//! session.select_all_duplicates();
//! let result = session.delete_selected_duplicates().await?;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use super::reconcile::{DeletionReconciler, DeletionResult};
use super::state::{Operation, ScanRecord, SessionPhase, SessionState, SessionView};
use crate::duplicates::PairStore;
use crate::error::SessionError;
use crate::services::{
    DeleteService, ImageSource, LocalImageSource, ScanService, ServiceError,
};

/// Marks an operation as outstanding until dropped.
///
/// Dropping clears the in-flight flag (and leaves `Scanning`) unless the
/// session was reset in the meantime.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    generation: u64,
    resume_phase: SessionPhase,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.generation != self.generation {
            return;
        }
        state.in_flight = None;
        if state.phase == SessionPhase::Scanning {
            state.phase = self.resume_phase;
        }
    }
}

/// Orchestrates scans, selections and deletions for a single session.
pub struct ScanSessionController {
    state: Mutex<SessionState>,
    scanner: Arc<dyn ScanService>,
    reconciler: DeletionReconciler,
    images: Arc<dyn ImageSource>,
}

impl ScanSessionController {
    /// Create a session in the `Idle` phase.
    #[must_use]
    pub fn new(scanner: Arc<dyn ScanService>, deleter: Arc<dyn DeleteService>) -> Self {
        Self::with_reconciler(scanner, DeletionReconciler::new(deleter))
    }

    /// Create a session with a pre-configured reconciler.
    #[must_use]
    pub fn with_reconciler(scanner: Arc<dyn ScanService>, reconciler: DeletionReconciler) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            scanner,
            reconciler,
            images: Arc::new(LocalImageSource),
        }
    }

    /// Serve images from `images` instead of the local filesystem.
    #[must_use]
    pub fn with_image_source(mut self, images: Arc<dyn ImageSource>) -> Self {
        self.images = images;
        self
    }

    // ==================== Queries ====================

    /// Presentation snapshot of the session.
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.state.lock().view()
    }

    /// Copy of the full session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    /// The outstanding operation, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<Operation> {
        self.state.lock().in_flight
    }

    /// Check whether a scan or delete is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight().is_some()
    }

    // ==================== Scanning ====================

    /// Scan `folder` and replace the session's findings with the result.
    ///
    /// Does not mark the scan as completed; only a deletion does.
    ///
    /// # Errors
    ///
    /// - `MissingFolder` if `folder` is empty (no service call)
    /// - `InvalidThreshold` if `threshold` is outside `[0, 1]` (no service call)
    /// - `OperationInFlight` if another scan or delete is outstanding
    /// - `SessionExhausted` if the session must be reset first
    /// - `ScanService` if the scan fails; previous findings stay in place
    pub async fn start_scan(&self, folder: &Path, threshold: f64) -> Result<(), SessionError> {
        if folder.as_os_str().is_empty() {
            return Err(SessionError::MissingFolder);
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SessionError::InvalidThreshold(threshold));
        }

        let in_flight = self.begin(Operation::Scan)?;
        log::info!(
            "Scanning {} at threshold {:.2}",
            folder.display(),
            threshold
        );

        let pairs = match self.scanner.scan(folder, threshold).await {
            Ok(pairs) => pairs,
            Err(e) => {
                log::error!("Scan of {} failed: {}", folder.display(), e);
                return Err(scan_error(&e));
            }
        };

        let mut state = self.state.lock();
        if state.generation != in_flight.generation {
            log::warn!(
                "Discarding {} pair(s) from a scan issued before the session was reset",
                pairs.len()
            );
            return Ok(());
        }

        state.set_pairs(PairStore::from(pairs));
        state.scan_completed = false;
        state.completion_dialog_visible = false;
        state.last_scan = Some(ScanRecord {
            folder: folder.to_path_buf(),
            threshold,
            scanned_at: Utc::now(),
        });
        log::debug!("Phase transition: {:?} -> Populated", state.phase);
        state.phase = SessionPhase::Populated;

        log::info!(
            "Loaded {} pair(s): {} original(s), {} duplicate(s)",
            state.pairs.len(),
            state.grouping.originals.len(),
            state.grouping.duplicates.len()
        );

        Ok(())
    }

    /// Discard everything and return to the initial `Idle` state.
    ///
    /// Always permitted. Results of calls still outstanding are dropped when
    /// they arrive.
    pub fn request_new_scan(&self) {
        let mut state = self.state.lock();
        let generation = state.generation + 1;
        *state = SessionState {
            generation,
            ..SessionState::default()
        };
        log::info!("Session reset (generation {})", generation);
    }

    /// Hide the completion dialog, keeping everything else.
    pub fn dismiss_completion_dialog(&self) {
        self.state.lock().completion_dialog_visible = false;
        log::debug!("Completion dialog dismissed");
    }

    // ==================== Selection ====================

    /// Toggle selection of an original. Paths not in the grouping are ignored.
    ///
    /// Returns whether the path is selected afterwards.
    pub fn toggle_original(&self, path: &Path) -> bool {
        let mut state = self.state.lock();
        if !state.grouping.has_original(path) {
            log::warn!("Ignoring toggle of unknown original: {}", path.display());
            return false;
        }
        state.selection.originals.toggle(path)
    }

    /// Toggle selection of a duplicate. Paths not in the grouping are ignored.
    ///
    /// Returns whether the path is selected afterwards.
    pub fn toggle_duplicate(&self, path: &Path) -> bool {
        let mut state = self.state.lock();
        if !state.grouping.has_duplicate(path) {
            log::warn!("Ignoring toggle of unknown duplicate: {}", path.display());
            return false;
        }
        state.selection.duplicates.toggle(path)
    }

    /// Select every original, or clear if all are already selected.
    pub fn select_all_originals(&self) {
        let mut state = self.state.lock();
        let SessionState {
            grouping, selection, ..
        } = &mut *state;
        selection.originals.select_all(&grouping.originals);
    }

    /// Select every duplicate, or clear if all are already selected.
    pub fn select_all_duplicates(&self) {
        let mut state = self.state.lock();
        let paths = state.grouping.duplicate_paths();
        state.selection.duplicates.select_all(&paths);
    }

    /// Clear both selections.
    pub fn clear_selection(&self) {
        self.state.lock().selection.clear();
    }

    // ==================== Deletion ====================

    /// Delete the selected originals.
    ///
    /// # Errors
    ///
    /// See [`ScanSessionController::delete_paths`].
    pub async fn delete_selected_originals(&self) -> Result<DeletionResult, SessionError> {
        let paths = self.state.lock().selection.originals.paths().clone();
        self.delete_paths(paths).await
    }

    /// Delete the selected duplicates.
    ///
    /// # Errors
    ///
    /// See [`ScanSessionController::delete_paths`].
    pub async fn delete_selected_duplicates(&self) -> Result<DeletionResult, SessionError> {
        let paths = self.state.lock().selection.duplicates.paths().clone();
        self.delete_paths(paths).await
    }

    /// Delete every duplicate in the grouping, whatever is selected.
    ///
    /// # Errors
    ///
    /// See [`ScanSessionController::delete_paths`].
    pub async fn delete_all_duplicates(&self) -> Result<DeletionResult, SessionError> {
        let paths: BTreeSet<PathBuf> = self
            .state
            .lock()
            .grouping
            .duplicates
            .iter()
            .map(|d| d.path.clone())
            .collect();
        self.delete_paths(paths).await
    }

    /// Delete `paths` and reconcile the session.
    ///
    /// The caller must already have the user's confirmation. Paths outside
    /// the current grouping are dropped before the service is called.
    ///
    /// # Errors
    ///
    /// - `EmptySelection` if `paths` is empty, or none of them is in the
    ///   current grouping (no service call)
    /// - `OperationInFlight` if another scan or delete is outstanding
    /// - `NoScanResults` if no scan has populated the session
    /// - `DeleteServiceUnavailable` if the call fails; nothing is changed
    pub async fn delete_paths(
        &self,
        paths: BTreeSet<PathBuf>,
    ) -> Result<DeletionResult, SessionError> {
        if paths.is_empty() {
            return Err(SessionError::EmptySelection);
        }

        let in_flight = self.begin(Operation::Delete)?;
        let paths = self.known_paths(paths)?;
        let report = self.reconciler.request(&paths).await?;

        let mut state = self.state.lock();
        if state.generation != in_flight.generation {
            log::warn!(
                "Session was reset during deletion; {} path(s) not reconciled",
                paths.len()
            );
            return Ok(DeletionResult {
                requested: paths,
                deleted_count: report.deleted,
                failed_count: report.failed,
                failed_paths: report.failed_paths,
                remaining_pairs: state.pairs.len(),
                completion_reached: false,
            });
        }

        Ok(self.reconciler.apply(&mut state, paths, report))
    }

    // ==================== Images ====================

    /// Fetch the bytes of an image for display.
    ///
    /// # Errors
    ///
    /// Whatever the image source reports.
    pub async fn fetch_image(&self, path: &Path) -> Result<Vec<u8>, ServiceError> {
        self.images.fetch_image(path).await
    }

    // ==================== Internals ====================

    fn begin(&self, operation: Operation) -> Result<InFlight<'_>, SessionError> {
        let mut state = self.state.lock();

        if let Some(current) = state.in_flight {
            log::warn!("Refusing {}: {} already in progress", operation, current);
            return Err(SessionError::OperationInFlight(current));
        }
        match (operation, state.phase) {
            (Operation::Scan, SessionPhase::Exhausted) => {
                return Err(SessionError::SessionExhausted);
            }
            (Operation::Delete, SessionPhase::Idle | SessionPhase::Scanning) => {
                log::warn!("Refusing delete: no scan results in the session");
                return Err(SessionError::NoScanResults);
            }
            _ => {}
        }

        let resume_phase = state.phase;
        state.in_flight = Some(operation);
        if operation == Operation::Scan {
            log::debug!("Phase transition: {:?} -> Scanning", state.phase);
            state.phase = SessionPhase::Scanning;
        }

        Ok(InFlight {
            state: &self.state,
            generation: state.generation,
            resume_phase,
        })
    }

    /// Keep only the paths listed as an original or duplicate right now.
    fn known_paths(&self, paths: BTreeSet<PathBuf>) -> Result<BTreeSet<PathBuf>, SessionError> {
        let state = self.state.lock();
        let (known, unknown): (BTreeSet<PathBuf>, BTreeSet<PathBuf>) =
            paths.into_iter().partition(|p| {
                state.grouping.has_original(p) || state.grouping.has_duplicate(p)
            });
        for path in &unknown {
            log::warn!("Ignoring delete of path outside the grouping: {}", path.display());
        }
        if known.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        Ok(known)
    }
}

impl std::fmt::Debug for ScanSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSessionController")
            .field("state", &*self.state.lock())
            .field("policy", &self.reconciler.policy())
            .finish_non_exhaustive()
    }
}

fn scan_error(e: &ServiceError) -> SessionError {
    SessionError::ScanService {
        message: e.service_message().map(str::to_string),
    }
}
