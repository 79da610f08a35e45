//! Narrow interfaces to the outside world.
//!
//! The engine never talks to a storage or CDN vendor directly; the hosting
//! binary supplies implementations of these traits. Implementations must be
//! `Send + Sync` because uploads may run on a worker pool.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use sitesync_core::{DistributionId, InvalidationBatch};

/// Error reported by a collaborator. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorError(pub String);

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for CollaboratorError {}

impl From<String> for CollaboratorError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CollaboratorError {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Transfers one local file to the object store.
pub trait Uploader: Send + Sync {
    /// Upload `local_path` under `remote_key`. `Ok` means the object is
    /// confirmed stored.
    fn upload(
        &self,
        local_path: &Path,
        remote_key: &str,
        content_type: &str,
    ) -> Result<(), CollaboratorError>;
}

/// Maps a file name to a MIME type.
pub trait ContentTypeClassifier: Send + Sync {
    /// `None` when the extension is unknown.
    fn classify(&self, file_name: &str) -> Option<String>;
}

/// Submits invalidation requests to a CDN.
pub trait CdnInvalidator: Send + Sync {
    /// Returns the CDN-assigned invalidation id.
    fn invalidate(
        &self,
        distribution: &DistributionId,
        batch: &InvalidationBatch,
    ) -> Result<String, CollaboratorError>;
}

/// Lists the keys stored in a bucket. Used by inspection tooling only.
pub trait ObjectLister {
    fn list(&self, bucket: &str) -> Result<BTreeSet<String>, CollaboratorError>;
}
