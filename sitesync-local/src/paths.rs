use std::path::{Path, PathBuf};

use crate::error::BackendError;

/// Overrides the state directory (default `~/.sitesync`).
pub const HOME_ENV: &str = "SITESYNC_HOME";

pub fn sitesync_root(home: &Path) -> PathBuf {
    home.join(".sitesync")
}

/// `$SITESYNC_HOME` when set and non-empty, else `~/.sitesync`.
pub fn resolve_root() -> Result<PathBuf, BackendError> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| sitesync_root(&home))
        .ok_or(BackendError::HomeNotFound)
}

pub fn buckets_dir(root: &Path) -> PathBuf {
    root.join("buckets")
}

pub fn bucket_dir(root: &Path, bucket: &str) -> PathBuf {
    buckets_dir(root).join(bucket)
}

/// Per-object metadata lives outside the bucket tree so listings stay clean.
pub fn meta_dir(root: &Path, bucket: &str) -> PathBuf {
    root.join("meta").join(bucket)
}

pub fn invalidations_dir(root: &Path) -> PathBuf {
    root.join("invalidations")
}

/// A name usable as one path segment: not empty, not `.`/`..`, no separators.
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

pub fn journal_path(root: &Path, distribution: &str) -> PathBuf {
    invalidations_dir(root).join(format!("{distribution}.jsonl"))
}
