//! Error types for sitesync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration problems detected before any side effect.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The local root passed on the command line does not exist.
    #[error("the directory {path} does not exist")]
    MissingRoot { path: PathBuf },

    /// The local root exists but is a regular file.
    #[error("{path} is not a directory")]
    RootNotDirectory { path: PathBuf },

    /// Distribution identifiers have a fixed length.
    #[error("invalid distribution id received: {id} (expected 13 characters, got {len})")]
    InvalidDistributionId { id: String, len: usize },

    /// An ignore rule could not be compiled into a glob.
    #[error("invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Settings file parse error, with the offending path.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
