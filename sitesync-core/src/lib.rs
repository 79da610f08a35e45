//! sitesync core library: domain types, settings, ignore rules, errors.
//!
//! - [`types`] — relative paths, file records, plans, invalidation batches
//! - [`ignore`] — [`IgnoreMatcher`]
//! - [`config`] — [`SyncConfig`] and the optional settings file
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod constants;
pub mod error;
pub mod ignore;
pub mod types;

pub use config::{Settings, SyncConfig};
pub use error::ConfigError;
pub use ignore::{IgnoreMatcher, IgnorePattern, PatternKind};
pub use types::{
    CacheEntry, DistributionId, FileRecord, HashAlgorithm, InvalidationBatch, PlannedUpload,
    RelativePath, SyncPlan, UnreadableFile,
};
