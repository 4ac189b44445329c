//! Rendering of session snapshots for the terminal.
//!
//! Text output mirrors the review screen: an originals list, a duplicates
//! list with similarity and parent, and the completion notice. JSON output
//! serializes the [`SessionView`] plus the outcome of any deletion.
//!
//! # JSON Schema
//!
//! ```json
//! {
//!   "session": {
//!     "status": "reviewing",
//!     "phase": "populated",
//!     "in_flight": null,
//!     "scan": { "folder": "photos", "threshold": 0.9, "scanned_at": "..." },
//!     "pair_count": 2,
//!     "originals": [{ "path": "photos/a.jpg", "name": "a.jpg", "selected": false }],
//!     "duplicates": [{ "path": "photos/b.jpg", "name": "b.jpg", "similarity": 0.93,
//!                      "original_path": "photos/a.jpg", "original_name": "a.jpg",
//!                      "selected": false }],
//!     "scan_completed": false,
//!     "completion_dialog_visible": false
//!   },
//!   "deletion": null,
//!   "exit_code": 0,
//!   "exit_code_name": "IS000"
//! }
//! ```

use std::io::{self, Write};

use serde::Serialize;
use yansi::Paint;

use crate::error::ExitCode;
use crate::services::ScanDepth;
use crate::session::{DeletionResult, SessionStatus, SessionView};

/// Heading of the completion notice.
pub const COMPLETED_TITLE: &str = "Processing completed!";
/// Prompt shown with the completion notice.
pub const COMPLETED_PROMPT: &str = "Would you like to scan another folder?";
/// Shown when a scan produced nothing to review.
pub const NO_DUPLICATES: &str = "No duplicate images found.";

/// Write a human-readable report of `view`.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_text<W: Write>(
    out: &mut W,
    view: &SessionView,
    deletion: Option<&DeletionResult>,
) -> io::Result<()> {
    if let Some(scan) = &view.scan {
        let depth = ScanDepth::from_threshold(scan.threshold).map_or_else(
            || format!("threshold {:.2}", scan.threshold),
            |depth| depth.label().to_string(),
        );
        writeln!(out, "Scanned {} ({})", scan.folder.display(), depth.dim())?;
        writeln!(out)?;
    }

    if let Some(result) = deletion {
        let summary = result.summary();
        if result.has_failures() {
            writeln!(out, "{}", summary.yellow())?;
            for path in &result.failed_paths {
                writeln!(out, "  {} {}", "failed:".red(), path.display())?;
            }
        } else {
            writeln!(out, "{}", summary.green())?;
        }
        writeln!(out)?;
    }

    match view.status {
        SessionStatus::NotScanned => return Ok(()),
        SessionStatus::NoDuplicatesFound => {
            writeln!(out, "{NO_DUPLICATES}")?;
            return Ok(());
        }
        SessionStatus::Completed => {
            writeln!(out, "{}", COMPLETED_TITLE.bold().green())?;
            writeln!(out, "{COMPLETED_PROMPT}")?;
            if view.originals.is_empty() && view.duplicates.is_empty() {
                return Ok(());
            }
            writeln!(out)?;
        }
        SessionStatus::Reviewing => {}
    }

    write_lists(out, view)
}

fn write_lists<W: Write>(out: &mut W, view: &SessionView) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        format!("Original Images ({})", view.originals.len()).bold()
    )?;
    for original in &view.originals {
        writeln!(
            out,
            "  {} {}  {}",
            checkbox(original.selected),
            original.name,
            original.path.display().dim()
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("Duplicate Images ({})", view.duplicates.len()).bold()
    )?;
    for duplicate in &view.duplicates {
        writeln!(
            out,
            "  {} {}  {}",
            checkbox(duplicate.selected),
            duplicate.name,
            duplicate.path.display().dim()
        )?;
        writeln!(
            out,
            "      Similarity: {:.2}  Duplicate of: {}",
            duplicate.similarity,
            duplicate.original_name.cyan()
        )?;
    }

    Ok(())
}

fn checkbox(selected: bool) -> &'static str {
    if selected {
        "[x]"
    } else {
        "[ ]"
    }
}

/// List the scan depths with their thresholds and descriptions.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_depths<W: Write>(out: &mut W, default: ScanDepth) -> io::Result<()> {
    for depth in ScanDepth::ALL {
        let marker = if depth == default { " (default)" } else { "" };
        writeln!(
            out,
            "{} {:.1}  {}{}",
            format!("{:<9}", depth.to_string()).bold(),
            depth.threshold(),
            depth.description(),
            marker.dim()
        )?;
    }
    Ok(())
}

/// Complete JSON report of a run.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Session snapshot after the run.
    pub session: &'a SessionView,
    /// Outcome of the deletion, if one was performed.
    pub deletion: Option<&'a DeletionResult>,
    /// The exit code number.
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g. "IS000").
    pub exit_code_name: &'static str,
}

impl<'a> JsonReport<'a> {
    /// Bundle a snapshot, optional deletion and exit code.
    #[must_use]
    pub fn new(
        session: &'a SessionView,
        deletion: Option<&'a DeletionResult>,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            session,
            deletion,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }
}
