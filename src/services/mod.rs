//! Collaborator contracts for a scan session.
//!
//! The session never computes similarity or touches storage itself. It talks
//! to three services:
//!
//! - [`ScanService`]: folder + threshold -> duplicate-pair findings
//! - [`DeleteService`]: set of paths -> aggregate deletion counts
//! - [`ImageSource`]: path -> raw image bytes (rendering only)
//!
//! Local implementations backed by the filesystem live in [`scan`],
//! [`delete`] and [`image`].

pub mod delete;
pub mod image;
pub mod scan;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duplicates::DuplicatePair;

pub use delete::{DeleteConfig, DeleteError, LocalDeleteService};
pub use image::LocalImageSource;
pub use scan::{LocalScanService, ScanConfig};

/// Error returned by a collaborator service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service answered, but with an error payload.
    #[error("{0}")]
    Rejected(String),

    /// The call failed entirely (service unreachable, worker crashed, ...).
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// The service-provided message, if the service answered at all.
    #[must_use]
    pub fn service_message(&self) -> Option<&str> {
        match self {
            Self::Rejected(message) => Some(message),
            Self::Unavailable(_) => None,
        }
    }
}

/// Aggregate outcome of a delete request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Number of files removed.
    pub deleted: usize,
    /// Number of files that could not be removed.
    pub failed: usize,
    /// Which paths failed, when the service knows. May be empty even if
    /// `failed > 0`.
    #[serde(default)]
    pub failed_paths: Vec<PathBuf>,
}

/// Finds pairs of similar images in a folder.
#[async_trait]
pub trait ScanService: Send + Sync {
    /// Scan `folder` and report every pair whose similarity is at least
    /// `threshold`.
    async fn scan(&self, folder: &Path, threshold: f64) -> Result<Vec<DuplicatePair>, ServiceError>;
}

/// Removes image files from storage.
#[async_trait]
pub trait DeleteService: Send + Sync {
    /// Attempt to remove every path in `paths`.
    async fn delete(&self, paths: &BTreeSet<PathBuf>) -> Result<DeleteReport, ServiceError>;
}

/// Serves raw image bytes for display.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the bytes of the image at `path`.
    async fn fetch_image(&self, path: &Path) -> Result<Vec<u8>, ServiceError>;
}

/// Recognized scan depths and their similarity thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDepth {
    /// 0.9 - nearly identical images only.
    Quick,
    /// 0.7 - similar images.
    Detailed,
    /// 0.5 - loosely similar images.
    #[default]
    Deep,
}

impl ScanDepth {
    /// All recognized depths, fastest first.
    pub const ALL: [ScanDepth; 3] = [Self::Quick, Self::Detailed, Self::Deep];

    /// Similarity threshold sent to the scan service.
    #[must_use]
    pub fn threshold(self) -> f64 {
        match self {
            Self::Quick => 0.9,
            Self::Detailed => 0.7,
            Self::Deep => 0.5,
        }
    }

    /// Short label for menus.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Quick => "Quick Scan",
            Self::Detailed => "Detailed Scan",
            Self::Deep => "Deep Scan",
        }
    }

    /// What this depth looks for.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Quick => "Fast scan for nearly identical images (90% similarity)",
            Self::Detailed => "Balanced scan for similar images (70% similarity)",
            Self::Deep => "Thorough scan for loosely similar images (50% similarity)",
        }
    }

    /// Map a raw threshold back to a recognized depth.
    #[must_use]
    pub fn from_threshold(threshold: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|depth| (depth.threshold() - threshold).abs() < f64::EPSILON)
    }

    /// Description for a raw threshold; `None` for unrecognized values.
    #[must_use]
    pub fn describe(threshold: f64) -> Option<&'static str> {
        Self::from_threshold(threshold).map(Self::description)
    }
}

impl fmt::Display for ScanDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quick => write!(f, "quick"),
            Self::Detailed => write!(f, "detailed"),
            Self::Deep => write!(f, "deep"),
        }
    }
}

impl FromStr for ScanDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "detailed" => Ok(Self::Detailed),
            "deep" => Ok(Self::Deep),
            other => Err(format!(
                "Unknown scan depth: '{other}' (expected quick, detailed or deep)"
            )),
        }
    }
}

/// Candidate locations for a user-supplied path, most specific first:
/// as given, relative to the working directory, relative to its parent.
#[must_use]
pub fn candidate_paths(path: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![path.to_path_buf()];
    if path.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(path));
            if let Some(parent) = cwd.parent() {
                candidates.push(parent.join(path));
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_depth_thresholds() {
        assert_eq!(ScanDepth::Quick.threshold(), 0.9);
        assert_eq!(ScanDepth::Detailed.threshold(), 0.7);
        assert_eq!(ScanDepth::Deep.threshold(), 0.5);
        assert_eq!(ScanDepth::default(), ScanDepth::Deep);
    }

    #[test]
    fn test_scan_depth_describe() {
        assert_eq!(
            ScanDepth::describe(0.9),
            Some("Fast scan for nearly identical images (90% similarity)")
        );
        assert_eq!(
            ScanDepth::describe(0.7),
            Some("Balanced scan for similar images (70% similarity)")
        );
        assert_eq!(ScanDepth::describe(0.6), None);
    }

    #[test]
    fn test_scan_depth_parse() {
        assert_eq!("Quick".parse::<ScanDepth>().unwrap(), ScanDepth::Quick);
        assert_eq!(" deep ".parse::<ScanDepth>().unwrap(), ScanDepth::Deep);
        assert!("fast".parse::<ScanDepth>().is_err());
    }

    #[test]
    fn test_service_message() {
        assert_eq!(
            ServiceError::Rejected("bad".into()).service_message(),
            Some("bad")
        );
        assert_eq!(ServiceError::Unavailable("down".into()).service_message(), None);
    }

    #[test]
    fn test_candidate_paths_absolute() {
        let abs = std::env::temp_dir();
        assert_eq!(candidate_paths(&abs), vec![abs.clone()]);
    }

    #[test]
    fn test_candidate_paths_relative() {
        let candidates = candidate_paths(Path::new("photos"));
        assert_eq!(candidates[0], PathBuf::from("photos"));
        assert!(candidates.len() >= 2);
        assert!(candidates[1].ends_with("photos"));
    }
}
