//! sitesync — push a local folder to a bucket, uploading only what changed.
//!
//! # Usage
//!
//! ```text
//! sitesync <local_root> <bucket_name> [-d|--distro_id <ID>] [-f|--force]
//!          [--threshold <N>] [--cache-file <PATH>] [--config <PATH>]
//!          [--hash md5|sha256] [--jobs <N>] [--dry-run]
//! ```
//!
//! Objects land in the directory bucket under `$SITESYNC_HOME` (default
//! `~/.sitesync`); invalidations are appended to its journal.

mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;

use sitesync_core::{HashAlgorithm, Settings, SyncConfig};
use sitesync_local::{paths, DirectoryBucket, JournalInvalidator};
use sitesync_sync::{pipeline, Collaborators, ExtensionTable};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "sitesync",
    version,
    about = "Incrementally sync a local folder to a bucket and invalidate the CDN",
    long_about = None,
)]
struct Cli {
    /// Folder whose contents are uploaded.
    local_root: PathBuf,

    /// Destination bucket.
    bucket_name: String,

    /// CDN distribution to invalidate after changes (13 characters).
    #[arg(short = 'd', long = "distro_id", visible_alias = "distro-id", value_name = "ID")]
    distro_id: Option<String>,

    /// Upload even when the number of new files exceeds the threshold.
    #[arg(short, long)]
    force: bool,

    /// Maximum number of new files accepted without --force.
    #[arg(long, value_name = "N")]
    threshold: Option<usize>,

    /// Where the content-hash cache is kept [default: ./cache.txt].
    #[arg(long, value_name = "PATH")]
    cache_file: Option<PathBuf>,

    /// Settings file [default: ./sitesync.yaml, if present].
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Digest used for change detection.
    #[arg(long, value_name = "ALG")]
    hash: Option<HashAlgorithm>,

    /// Number of parallel uploads.
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,

    /// Report what would be uploaded without uploading or writing the cache.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Defaults, then the settings file, then flags.
    fn sync_config(&self) -> Result<SyncConfig> {
        let settings = self.settings()?;

        let mut config = SyncConfig::new(&self.local_root, &self.bucket_name);
        config.distribution_id = self.distro_id.clone();
        let mut config = config.with_settings(&settings);

        if let Some(threshold) = self.threshold {
            config.new_file_threshold = threshold;
        }
        if let Some(path) = &self.cache_file {
            config.cache_path = path.clone();
        }
        if let Some(algorithm) = self.hash {
            config.hash_algorithm = algorithm;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs.max(1);
        }
        config.force = self.force;
        config.dry_run = self.dry_run;
        Ok(config)
    }

    fn settings(&self) -> Result<Settings> {
        let path = match &self.config {
            Some(path) => {
                if !path.is_file() {
                    bail!("settings file not found: {}", path.display());
                }
                path.clone()
            }
            None => Settings::default_path(Path::new(".")),
        };
        Settings::load(&path).with_context(|| format!("cannot load settings from {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => report::print_fatal(&err),
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.sync_config()?;
    tracing::debug!("resolved configuration: {config:?}");

    let state = paths::resolve_root().context("cannot locate the sitesync state directory")?;
    let bucket = DirectoryBucket::new(&state, &config.bucket)?;
    let invalidator = JournalInvalidator::new(&state);
    let classifier = ExtensionTable::default();
    let collaborators = Collaborators {
        uploader: &bucket,
        classifier: &classifier,
        invalidator: Some(&invalidator),
    };

    let report = pipeline::run(&config, &collaborators)?;
    report::print_report(&report);
    Ok(ExitCode::from(report.exit_code()))
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
