//! imagesweep - Review and remove similar images
//!
//! A session engine for reviewing perceptual-duplicate findings: a scan
//! service reports `(original, duplicate, similarity)` pairs, the session
//! derives de-duplicated originals/duplicates lists, tracks the user's
//! selections, and reconciles its findings after deletions.
//!
//! # Modules
//!
//! * [`duplicates`]: pair store and the grouping derived from it
//! * [`session`]: selection tracking, deletion reconciliation, the controller
//! * [`services`]: scan/delete/image contracts and local implementations
//! * [`output`]: text and JSON rendering of session snapshots
//! * [`cli`], [`config`], [`logging`], [`error`]: the command-line surface

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod services;
pub mod session;

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::{Cli, Commands, DeleteTarget, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::{write_depths, write_text, JsonReport};
use crate::services::{DeleteConfig, LocalDeleteService, LocalScanService};
use crate::session::{DeletionReconciler, DeletionResult, ScanSessionController, SessionStatus};

/// Message shown while a scan is outstanding.
pub const SCANNING_MESSAGE: &str = "Scanning for duplicate images...";

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the scan or delete
/// fails, or output cannot be written.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    log::debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Depths => {
            write_depths(&mut io::stdout().lock(), config.default_depth)?;
            Ok(ExitCode::Success)
        }
        Commands::Scan(args) => run_scan(&args, &config, cli.quiet),
    }
}

fn run_scan(args: &ScanArgs, config: &Config, quiet: bool) -> anyhow::Result<ExitCode> {
    if args.delete.is_some() && !args.yes {
        bail!("refusing to delete without confirmation; pass --yes to proceed");
    }

    let threshold = args.resolve_threshold(config.default_depth);
    let policy = args.policy.map_or(config.deletion_policy, Into::into);
    let delete_config = DeleteConfig {
        permanent: args.permanent || config.permanent,
    };

    let session = ScanSessionController::with_reconciler(
        Arc::new(LocalScanService::new(config.scan_config())),
        DeletionReconciler::new(Arc::new(LocalDeleteService::new(delete_config)))
            .with_policy(policy)
            .with_completion_threshold(config.completion_max_remaining_pairs),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let show_spinner = !quiet && args.output == OutputFormat::Text;
    let deletion = runtime.block_on(async {
        let spinner = show_spinner.then(scan_spinner);
        let scanned = session.start_scan(&args.folder, threshold).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        scanned?;

        apply_selections(&session, &args.selections, args.delete);

        match args.delete {
            Some(target) => delete_target(&session, target).await,
            None => Ok(None),
        }
    })?;

    let view = session.view();
    let exit_code = match &deletion {
        Some(result) if result.has_failures() => ExitCode::PartialSuccess,
        Some(_) => ExitCode::Success,
        None if view.status == SessionStatus::NoDuplicatesFound => ExitCode::NoDuplicates,
        None => ExitCode::Success,
    };

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Text => write_text(&mut stdout, &view, deletion.as_ref())?,
        OutputFormat::Json => JsonReport::new(&view, deletion.as_ref(), exit_code).write_to(&mut stdout)?,
    }
    stdout.flush()?;

    Ok(exit_code)
}

async fn delete_target(
    session: &ScanSessionController,
    target: DeleteTarget,
) -> anyhow::Result<Option<DeletionResult>> {
    if session.view().status == SessionStatus::NoDuplicatesFound {
        log::info!("Nothing to delete");
        return Ok(None);
    }

    let result = match target {
        DeleteTarget::AllDuplicates => session.delete_all_duplicates().await?,
        DeleteTarget::SelectedDuplicates => session.delete_selected_duplicates().await?,
        DeleteTarget::SelectedOriginals => session.delete_selected_originals().await?,
    };
    log::info!("{}", result.summary());
    Ok(Some(result))
}

/// Toggle each `--select` path in the list the delete target reads from, or in
/// both lists when no deletion was requested.
fn apply_selections(
    session: &ScanSessionController,
    selections: &[PathBuf],
    target: Option<DeleteTarget>,
) {
    if selections.is_empty() {
        return;
    }
    if target == Some(DeleteTarget::AllDuplicates) {
        log::warn!("--select has no effect with --delete all-duplicates");
        return;
    }

    let snapshot = session.snapshot();
    let originals = &snapshot.grouping.originals;
    let duplicates = snapshot.grouping.duplicate_paths();
    let wanted: BTreeSet<&PathBuf> = selections.iter().collect();

    for path in wanted {
        let original = find_path(originals, path);
        let duplicate = find_path(&duplicates, path);

        let toggled = match target {
            Some(DeleteTarget::SelectedOriginals) => original.map(|p| session.toggle_original(p)),
            Some(DeleteTarget::SelectedDuplicates) => {
                duplicate.map(|p| session.toggle_duplicate(p))
            }
            Some(DeleteTarget::AllDuplicates) => None,
            None => {
                let a = original.map(|p| session.toggle_original(p));
                let b = duplicate.map(|p| session.toggle_duplicate(p));
                a.or(b)
            }
        };

        if toggled.is_none() {
            log::warn!("Selected path is not in the scan results: {}", path.display());
        }
    }
}

/// Match a user-supplied path against scan results, literally or after
/// canonicalization.
fn find_path<'a>(paths: &'a [PathBuf], wanted: &Path) -> Option<&'a Path> {
    if let Some(found) = paths.iter().find(|p| p.as_path() == wanted) {
        return Some(found);
    }
    let wanted = wanted.canonicalize().ok()?;
    paths
        .iter()
        .find(|p| p.canonicalize().is_ok_and(|c| c == wanted))
        .map(PathBuf::as_path)
}

fn scan_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(SCANNING_MESSAGE);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
