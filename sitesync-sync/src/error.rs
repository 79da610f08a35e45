//! Error types for sitesync-sync.

use std::path::PathBuf;

use thiserror::Error;

use sitesync_core::ConfigError;

/// Fatal errors that end a sync run.
///
/// Per-file problems (unreadable file, failed upload, unknown extension)
/// are not errors at this level; they are collected in the run report.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Bad root, bad distribution id, bad ignore rule or settings file.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Too many new files and `force` was not set. Nothing was uploaded
    /// and the cache file was not touched.
    #[error(
        "the local project folder contains {count} new files (threshold {threshold}): {}; \
         re-run with --force to sync them",
        .preview.join(", ")
    )]
    GuardTripped {
        count: usize,
        threshold: usize,
        /// First few new paths, sorted.
        preview: Vec<String>,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file contains a line that is not `path<TAB>hash`.
    #[error("malformed cache line {line} in {path}: {content:?}")]
    MalformedCache {
        path: PathBuf,
        line: usize,
        content: String,
    },

    /// A file name the cache format cannot represent (tab or line break).
    #[error("file name cannot be recorded in the cache: {path:?}")]
    UnsupportedName { path: String },

    /// Directory traversal failed below the local root.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A collaborator reported a failure outside the per-file loop.
    #[error("{0}")]
    Collaborator(String),
}

impl SyncError {
    /// Process exit code for the hosting CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Config(ConfigError::InvalidDistributionId { .. }) => 2,
            _ => 1,
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
