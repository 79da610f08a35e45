//! Human-readable output for a finished (or aborted) run.

use std::process::ExitCode;

use colored::Colorize;

use sitesync_core::constants::DEFAULT_CONTENT_TYPE;
use sitesync_sync::{FailureKind, InvalidationOutcome, SyncError, SyncReport};

pub fn print_report(report: &SyncReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };

    if report.is_noop() {
        println!(
            "{prefix}No changes detected; '{}' is already up to date ({} unchanged)",
            report.bucket, report.unchanged
        );
        return;
    }

    for key in &report.uploaded {
        println!("{prefix}updating: {key}");
    }

    if report.dry_run {
        println!(
            "{prefix}{} file(s) would be updated in '{}' ({} unchanged)",
            report.uploaded.len(),
            report.bucket,
            report.unchanged
        );
    } else {
        println!(
            "{} {} file(s) updated in '{}' ({} unchanged)",
            "✓".green().bold(),
            report.uploaded.len(),
            report.bucket,
            report.unchanged
        );
    }

    for key in &report.classification_misses {
        println!("  ?  {key}: unknown content type, sent as {DEFAULT_CONTENT_TYPE}");
    }

    match &report.invalidation {
        Some(InvalidationOutcome::Created {
            invalidation_id,
            batch,
        }) => println!(
            "invalidation {invalidation_id} created for {} path(s)",
            batch.paths.len()
        ),
        Some(InvalidationOutcome::Failed { reason, .. }) => {
            eprintln!("{} invalidation failed: {reason}", "warning:".yellow().bold())
        }
        None => {}
    }

    if !report.failures.is_empty() {
        eprintln!(
            "{} {} file(s) were not synced and will be retried next run:",
            "warning:".yellow().bold(),
            report.failures.len()
        );
        for failure in &report.failures {
            let kind = match failure.kind {
                FailureKind::Read => "read",
                FailureKind::Upload => "upload",
            };
            eprintln!("  ✗  {} ({kind}): {}", failure.path, failure.reason);
        }
    }
}

/// Print a fatal error and map it to the process exit code.
pub fn print_fatal(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<SyncError>() {
        Some(guard @ SyncError::GuardTripped { .. }) => {
            eprintln!("{} {guard}", "warning:".yellow().bold());
            ExitCode::from(guard.exit_code())
        }
        Some(sync) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(sync.exit_code())
        }
        None => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
