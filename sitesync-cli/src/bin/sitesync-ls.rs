//! sitesync-ls — list the keys stored in a bucket, one per line, sorted.
//!
//! ```text
//! sitesync-ls <bucket_name>
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use sitesync_local::{paths, DirectoryStore};
use sitesync_sync::ObjectLister;

#[derive(Parser, Debug)]
#[command(name = "sitesync-ls", version, about = "List the keys stored in a bucket")]
struct Cli {
    /// Bucket to list.
    bucket_name: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let state = paths::resolve_root().context("cannot locate the sitesync state directory")?;
    let keys = DirectoryStore::new(state)
        .list(&cli.bucket_name)
        .with_context(|| format!("cannot list bucket '{}'", cli.bucket_name))?;
    tracing::debug!("{} key(s) in {}", keys.len(), cli.bucket_name);
    for key in keys {
        println!("{key}");
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
