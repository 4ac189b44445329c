//! Command-line interface definitions for imagesweep.
//!
//! # Example
//!
//! ```bash
//! # Deep scan (default) with a text report
//! imagesweep scan ~/Pictures/holiday
//!
//! # Quick scan, JSON output
//! imagesweep scan ~/Pictures/holiday --depth quick --output json
//!
//! # Move every duplicate to the trash
//! imagesweep scan ~/Pictures/holiday --delete all-duplicates --yes
//!
//! # Delete two chosen duplicates permanently
//! imagesweep scan ./holiday --select holiday/b.jpg --select holiday/c.jpg \
//!     --delete selected-duplicates --permanent --yes
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::services::ScanDepth;
use crate::session::DeletionPolicy;

/// Review and remove similar images found by a duplicate scan.
#[derive(Debug, Parser)]
#[command(name = "imagesweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a folder for similar images and optionally delete some
    Scan(ScanArgs),
    /// List the recognized scan depths
    Depths,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Folder to scan
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Scan depth (quick = 0.9, detailed = 0.7, deep = 0.5)
    #[arg(short, long, value_enum, conflicts_with = "threshold")]
    pub depth: Option<DepthArg>,

    /// Raw similarity threshold in [0, 1]
    #[arg(short, long, value_name = "F", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Select a path for deletion (original or duplicate); repeatable
    #[arg(short, long = "select", value_name = "PATH")]
    pub selections: Vec<PathBuf>,

    /// What to delete after the scan
    #[arg(long, value_enum, value_name = "TARGET")]
    pub delete: Option<DeleteTarget>,

    /// Confirm deletion without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Delete permanently instead of moving to the trash
    #[arg(long)]
    pub permanent: bool,

    /// How failed deletions are reconciled
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,
}

impl ScanArgs {
    /// Threshold to scan with: `--threshold`, else `--depth`, else `default`.
    #[must_use]
    pub fn resolve_threshold(&self, default: ScanDepth) -> f64 {
        self.threshold
            .or_else(|| self.depth.map(|d| ScanDepth::from(d).threshold()))
            .unwrap_or_else(|| default.threshold())
    }
}

/// Scan depth argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DepthArg {
    /// Nearly identical images (0.9)
    Quick,
    /// Similar images (0.7)
    Detailed,
    /// Loosely similar images (0.5)
    Deep,
}

impl From<DepthArg> for ScanDepth {
    fn from(arg: DepthArg) -> Self {
        match arg {
            DepthArg::Quick => ScanDepth::Quick,
            DepthArg::Detailed => ScanDepth::Detailed,
            DepthArg::Deep => ScanDepth::Deep,
        }
    }
}

/// Deletion policy argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Hide every requested image, even ones that failed to delete
    Optimistic,
    /// Keep images the delete service reported as failed
    KeepFailed,
}

impl From<PolicyArg> for DeletionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Optimistic => DeletionPolicy::Optimistic,
            PolicyArg::KeepFailed => DeletionPolicy::KeepFailed,
        }
    }
}

/// Which images to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeleteTarget {
    /// Every duplicate found by the scan
    AllDuplicates,
    /// Duplicates chosen with --select
    SelectedDuplicates,
    /// Originals chosen with --select
    SelectedOriginals,
}

/// Output format for the session report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// JSON snapshot of the session
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a similarity threshold in `[0, 1]`.
///
/// ```
/// use imagesweep::cli::parse_threshold;
///
/// assert_eq!(parse_threshold("0.75").unwrap(), 0.75);
/// assert!(parse_threshold("1.5").is_err());
/// ```
///
/// # Errors
///
/// Returns an error if the value is not a number or is outside `[0, 1]`.
pub fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: '{s}'"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("Threshold must be between 0 and 1 (got {value})"));
    }
    Ok(value)
}
