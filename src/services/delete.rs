//! Local delete service: removes image files from the filesystem.
//!
//! # Overview
//!
//! Files are moved to the system trash by default (recoverable) or removed
//! permanently when [`DeleteConfig::permanent`] is set. A batch never stops at
//! the first failure: every requested path is attempted and the outcome is
//! reported as aggregate counts plus the list of failed paths.
//!
//! User-supplied paths are resolved with [`super::candidate_paths`], so a path
//! relative to the scanned folder's parent still finds its file.
//!
//! # Example
//!
//! ```no_run
//! use imagesweep::services::delete::{delete_batch, DeleteConfig};
//! use std::path::PathBuf;
//!
//! let paths = vec![PathBuf::from("/photos/copy.jpg")];
//! let result = delete_batch(&paths, &DeleteConfig::default());
//! println!("{}", result.summary());
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use super::{candidate_paths, DeleteReport, DeleteService, ServiceError};

/// Error type for deletion of a single file.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found at any candidate location.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone, Default)]
pub struct DeleteConfig {
    /// Use permanent deletion instead of trash.
    pub permanent: bool,
}

impl DeleteConfig {
    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self::default()
    }

    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self { permanent: true }
    }
}

/// Results of a batch deletion.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Requested paths that were removed.
    pub successes: Vec<PathBuf>,
    /// Requested paths that could not be removed, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Deleted {} file(s), {} failed",
            self.success_count(),
            self.failure_count()
        )
    }

    /// Collapse into the aggregate report returned to the session.
    #[must_use]
    pub fn into_report(self) -> DeleteReport {
        DeleteReport {
            deleted: self.successes.len(),
            failed: self.failures.len(),
            failed_paths: self.failures.into_iter().map(|(path, _)| path).collect(),
        }
    }
}

/// Find the first candidate location of `path` that is an existing file.
fn resolve_file(path: &Path) -> Option<PathBuf> {
    candidate_paths(path).into_iter().find(|p| p.is_file())
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if the file can't be inspected
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<(), DeleteError> {
    fs::metadata(path).map_err(|e| DeleteError::from_io(path, e))?;

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {}", path.display());
    Ok(())
}

/// Permanently delete a single file.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if the file can't be inspected
/// - `PermanentDeleteFailed` if the removal fails
pub fn permanent_delete(path: &Path) -> Result<(), DeleteError> {
    fs::metadata(path).map_err(|e| DeleteError::from_io(path, e))?;

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Permanently deleted: {}", path.display());
    Ok(())
}

/// Delete multiple files, continuing past failures.
///
/// Paths are reported back exactly as requested, not as resolved.
#[must_use]
pub fn delete_batch(paths: &[PathBuf], config: &DeleteConfig) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();

    for path in paths {
        let outcome = match resolve_file(path) {
            Some(resolved) if config.permanent => permanent_delete(&resolved),
            Some(resolved) => delete_to_trash(&resolved),
            None => Err(DeleteError::NotFound(path.clone())),
        };

        match outcome {
            Ok(()) => result.successes.push(path.clone()),
            Err(e) => {
                log::warn!("Failed to delete {}: {}", path.display(), e);
                result.failures.push((path.clone(), e.to_string()));
            }
        }
    }

    log::info!("{}", result.summary());
    result
}

/// [`DeleteService`] that removes files from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalDeleteService {
    config: DeleteConfig,
}

impl LocalDeleteService {
    /// Create a service with the given deletion mode.
    #[must_use]
    pub fn new(config: DeleteConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DeleteService for LocalDeleteService {
    async fn delete(&self, paths: &BTreeSet<PathBuf>) -> Result<DeleteReport, ServiceError> {
        if paths.is_empty() {
            return Err(ServiceError::Rejected(
                "No images specified for deletion".to_string(),
            ));
        }

        let paths: Vec<PathBuf> = paths.iter().cloned().collect();
        let config = self.config.clone();

        let result = tokio::task::spawn_blocking(move || delete_batch(&paths, &config))
            .await
            .map_err(|e| ServiceError::Unavailable(format!("delete worker failed: {e}")))?;

        Ok(result.into_report())
    }
}
