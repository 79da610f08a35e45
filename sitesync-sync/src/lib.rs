//! # sitesync-sync
//!
//! Incremental upload engine: walk, diff against the content-hash cache,
//! upload what changed, persist the cache, invalidate the CDN.
//!
//! Call [`pipeline::run`] with a [`sitesync_core::SyncConfig`] and a set of
//! [`Collaborators`].

pub mod cache_store;
pub mod collaborators;
pub mod content_type;
pub mod diff;
pub mod error;
pub mod hash;
pub mod invalidation;
pub mod pipeline;
pub mod walker;

pub use cache_store::Cache;
pub use collaborators::{
    CdnInvalidator, CollaboratorError, ContentTypeClassifier, ObjectLister, Uploader,
};
pub use content_type::ExtensionTable;
pub use diff::DiffEngine;
pub use error::SyncError;
pub use invalidation::InvalidationBatcher;
pub use pipeline::{
    run, Collaborators, FailureKind, FileFailure, InvalidationOutcome, SyncReport, EXIT_PARTIAL,
};
pub use walker::TreeWalker;
