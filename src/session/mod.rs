//! Scan session: selection tracking, deletion reconciliation, orchestration.
//!
//! # Architecture
//!
//! * [`selection`]: per-list selection sets scoped to the current grouping.
//! * [`state`]: the session value and its presentation snapshot.
//! * [`reconcile`]: deletes through the delete service and filters findings.
//! * [`controller`]: the session state machine tying scans and deletes together.

pub mod controller;
pub mod reconcile;
pub mod selection;
pub mod state;

pub use controller::ScanSessionController;
pub use reconcile::{
    DeletionPolicy, DeletionReconciler, DeletionResult, COMPLETION_MAX_REMAINING_PAIRS,
};
pub use selection::{SelectionState, SelectionTracker};
pub use state::{
    DuplicateView, Operation, OriginalView, ScanRecord, SessionPhase, SessionState, SessionStatus,
    SessionView,
};
