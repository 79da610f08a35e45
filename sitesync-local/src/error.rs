use std::path::PathBuf;

use thiserror::Error;

use sitesync_sync::CollaboratorError;

/// Error surface for the local bucket and invalidation journal.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    #[error("invalid bucket name '{0}'")]
    InvalidBucket(String),

    #[error("distribution id '{0}' cannot name a journal file")]
    InvalidDistribution(String),

    #[error("cannot determine home directory; set $HOME or $SITESYNC_HOME")]
    HomeNotFound,
}

impl From<BackendError> for CollaboratorError {
    fn from(err: BackendError) -> Self {
        CollaboratorError(err.to_string())
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> BackendError {
    BackendError::Io {
        path: path.into(),
        source,
    }
}
