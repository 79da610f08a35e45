//! Sync orchestration: the single entrypoint used by the CLI.
//!
//! One run, in order; each step is a precondition for the next:
//!
//! 1. Validate the local root.
//! 2. Validate the distribution id, when one is configured.
//! 3. Load ignore rules; load and reconcile the cache.
//! 4. Walk the tree and plan (new-file guard first, then hashing).
//! 5. Classify and upload each changed file; cache entries are updated only
//!    for confirmed uploads.
//! 6. Persist the cache, once.
//! 7. Submit a CDN invalidation when something changed and a distribution
//!    is configured.
//!
//! Fatal errors (1–4) return before any side effect. Per-file failures are
//! collected in the [`SyncReport`].

use std::path::Path;

use rayon::prelude::*;

use sitesync_core::{
    constants::DEFAULT_CONTENT_TYPE, ConfigError, DistributionId, IgnoreMatcher,
    InvalidationBatch, PlannedUpload, RelativePath, SyncConfig, SyncPlan,
};

use crate::cache_store::{self, Cache};
use crate::collaborators::{CdnInvalidator, CollaboratorError, ContentTypeClassifier, Uploader};
use crate::diff::DiffEngine;
use crate::error::SyncError;
use crate::invalidation::InvalidationBatcher;
use crate::walker::TreeWalker;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Exit code for a run that finished but left some files unsynced.
pub const EXIT_PARTIAL: u8 = 3;

/// The external services a run talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub uploader: &'a dyn Uploader,
    pub classifier: &'a dyn ContentTypeClassifier,
    /// Only consulted when a distribution id is configured.
    pub invalidator: Option<&'a dyn CdnInvalidator>,
}

/// Why a file was left out of the synced set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Read,
    Upload,
}

/// A non-fatal per-file failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Outcome of step 7.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationOutcome {
    Created {
        invalidation_id: String,
        batch: InvalidationBatch,
    },
    Failed {
        batch: InvalidationBatch,
        reason: String,
    },
}

/// Summary of one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub bucket: String,
    /// Keys uploaded (or, in a dry run, that would be uploaded), sorted.
    pub uploaded: Vec<RelativePath>,
    pub unchanged: usize,
    pub new_files: usize,
    /// Cache entries dropped during reconciliation.
    pub pruned: Vec<RelativePath>,
    /// Files uploaded with the default content type.
    pub classification_misses: Vec<RelativePath>,
    pub failures: Vec<FileFailure>,
    pub invalidation: Option<InvalidationOutcome>,
    pub dry_run: bool,
}

impl SyncReport {
    /// Nothing changed and nothing failed.
    pub fn is_noop(&self) -> bool {
        self.uploaded.is_empty() && self.failures.is_empty()
    }

    /// Every planned step succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
            && !matches!(self.invalidation, Some(InvalidationOutcome::Failed { .. }))
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_clean() {
            0
        } else {
            EXIT_PARTIAL
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Per-run mutable state, owned by [`run`] and threaded through each step.
struct SyncSession<'a> {
    config: &'a SyncConfig,
    distribution: Option<DistributionId>,
    matcher: IgnoreMatcher,
    cache: Cache,
    report: SyncReport,
}

impl<'a> SyncSession<'a> {
    /// Steps 1–3.
    fn start(config: &'a SyncConfig) -> Result<Self, SyncError> {
        validate_root(&config.local_root)?;
        let distribution = config
            .distribution_id
            .as_deref()
            .map(DistributionId::parse)
            .transpose()?;

        tracing::info!(
            "updating '{}' from project folder: {}",
            config.bucket,
            config.local_root.display()
        );

        let matcher = IgnoreMatcher::load_file(&config.ignore_file_path())?;
        let mut cache = cache_store::load(&config.cache_path)?;
        let pruned = cache_store::reconcile(&mut cache, &config.local_root, &matcher);

        Ok(Self {
            config,
            distribution,
            matcher,
            cache,
            report: SyncReport {
                bucket: config.bucket.clone(),
                pruned,
                dry_run: config.dry_run,
                ..SyncReport::default()
            },
        })
    }

    /// Step 4. The walk and the cache are snapshotted here, before any upload.
    fn plan(&mut self) -> Result<SyncPlan, SyncError> {
        let walker = TreeWalker::new(
            &self.config.local_root,
            self.matcher.clone(),
            self.config.cache_file_name(),
        );
        let (records, walk_errors) = walker.walk();
        for err in walk_errors {
            let path = match &err {
                SyncError::Walk(walk) => walk
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                SyncError::UnsupportedName { path } => path.clone(),
                _ => String::new(),
            };
            tracing::warn!("skipping unreadable entry {path}: {err}");
            self.report.failures.push(FileFailure {
                path,
                kind: FailureKind::Read,
                reason: err.to_string(),
            });
        }

        let plan = DiffEngine::from_config(self.config).plan(records, &self.cache)?;
        self.report.new_files = plan.new_files.len();
        self.report.unchanged = plan.unchanged.len();
        for unreadable in &plan.unreadable {
            self.report.failures.push(FileFailure {
                path: unreadable.record.relative.0.clone(),
                kind: FailureKind::Read,
                reason: unreadable.reason.clone(),
            });
        }
        Ok(plan)
    }

    /// Step 5.
    fn upload(&mut self, plan: SyncPlan, collaborators: &Collaborators<'_>) {
        let mut uploads = plan.changed;
        for upload in &mut uploads {
            let record = &mut upload.record;
            let content_type = match collaborators.classifier.classify(record.relative.file_name()) {
                Some(content_type) => content_type,
                None => {
                    tracing::warn!(
                        "unknown content type for {}; using {DEFAULT_CONTENT_TYPE}",
                        record.relative
                    );
                    self.report
                        .classification_misses
                        .push(record.relative.clone());
                    DEFAULT_CONTENT_TYPE.to_owned()
                }
            };
            record.content_type = Some(content_type);
        }

        let outcomes = upload_all(uploads, collaborators.uploader, self.config.jobs);

        // Single writer: only this thread touches the cache map.
        for (upload, outcome) in outcomes {
            let key = upload.record.relative;
            match outcome {
                Ok(()) => {
                    self.cache.insert(key.clone(), upload.hash);
                    self.report.uploaded.push(key);
                }
                Err(err) => {
                    tracing::warn!("upload failed for {key}: {err}");
                    self.report.failures.push(FileFailure {
                        path: key.0,
                        kind: FailureKind::Upload,
                        reason: err.to_string(),
                    });
                }
            }
        }
        self.report.uploaded.sort();
    }

    /// Step 6.
    fn persist(&self) -> Result<(), SyncError> {
        cache_store::save(&self.cache, &self.config.cache_path)
    }

    /// Step 7.
    fn invalidate(&mut self, collaborators: &Collaborators<'_>) {
        let Some(distribution) = self.distribution.as_ref() else {
            return;
        };
        if self.report.uploaded.is_empty() {
            return;
        }
        let Some(invalidator) = collaborators.invalidator else {
            tracing::warn!("distribution {distribution} configured but no invalidator available");
            return;
        };

        let batch = InvalidationBatcher::new(self.config.index_document.as_str())
            .batch(&self.report.uploaded);
        tracing::info!(
            "invalidating {} path(s) on distribution {distribution}",
            batch.paths.len()
        );
        let outcome = match invalidator.invalidate(distribution, &batch) {
            Ok(invalidation_id) => InvalidationOutcome::Created {
                invalidation_id,
                batch,
            },
            Err(err) => {
                tracing::warn!("invalidation failed: {err}");
                InvalidationOutcome::Failed {
                    batch,
                    reason: err.to_string(),
                }
            }
        };
        self.report.invalidation = Some(outcome);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run one sync of `config.local_root` into `config.bucket`.
///
/// Returns `Err` only for fatal conditions, all of which are detected before
/// anything is uploaded or written. A dry run stops after planning.
pub fn run(config: &SyncConfig, collaborators: &Collaborators<'_>) -> Result<SyncReport, SyncError> {
    let mut session = SyncSession::start(config)?;
    let plan = session.plan()?;

    if config.dry_run {
        session.report.uploaded = plan
            .changed
            .into_iter()
            .map(|u| u.record.relative)
            .collect();
        return Ok(session.report);
    }

    session.upload(plan, collaborators);
    session.persist()?;
    session.invalidate(collaborators);
    Ok(session.report)
}

fn validate_root(root: &Path) -> Result<(), ConfigError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ConfigError::RootNotDirectory {
            path: root.to_path_buf(),
        }),
        Err(_) => Err(ConfigError::MissingRoot {
            path: root.to_path_buf(),
        }),
    }
}

type UploadOutcome = (PlannedUpload, Result<(), CollaboratorError>);

fn upload_all(uploads: Vec<PlannedUpload>, uploader: &dyn Uploader, jobs: usize) -> Vec<UploadOutcome> {
    if jobs > 1 && uploads.len() > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => {
                return pool.install(|| {
                    uploads
                        .into_par_iter()
                        .map(|upload| upload_one(uploader, upload))
                        .collect()
                });
            }
            Err(err) => tracing::warn!("cannot start upload pool ({err}); uploading sequentially"),
        }
    }
    uploads
        .into_iter()
        .map(|upload| upload_one(uploader, upload))
        .collect()
}

fn upload_one(uploader: &dyn Uploader, upload: PlannedUpload) -> UploadOutcome {
    let record = &upload.record;
    let content_type = record.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
    tracing::info!("updating: {} ({content_type})", record.relative);
    let result = uploader.upload(&record.absolute, record.relative.as_str(), content_type);
    (upload, result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
