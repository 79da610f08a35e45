//! Change detection and the new-file guard.
//!
//! A walked file is *changed* when its digest differs from its cache entry
//! or it has no entry at all. Before anything is hashed, the set of new
//! files (walked paths absent from the pre-run cache) is checked against
//! the threshold; exceeding it without `force` fails the whole run.

use std::collections::BTreeSet;

use sitesync_core::{
    constants::GUARD_PREVIEW_LEN, FileRecord, HashAlgorithm, PlannedUpload, RelativePath,
    SyncConfig, SyncPlan, UnreadableFile,
};

use crate::cache_store::Cache;
use crate::error::SyncError;
use crate::hash::hash_file;

/// Computes a [`SyncPlan`] from one walk snapshot and the reconciled cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEngine {
    algorithm: HashAlgorithm,
    threshold: usize,
    force: bool,
}

impl DiffEngine {
    pub fn new(algorithm: HashAlgorithm, threshold: usize, force: bool) -> Self {
        Self {
            algorithm,
            threshold,
            force,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.hash_algorithm,
            config.new_file_threshold,
            config.force,
        )
    }

    /// Walked paths with no cache entry.
    pub fn new_files(records: &[FileRecord], cache: &Cache) -> BTreeSet<RelativePath> {
        records
            .iter()
            .filter(|r| !cache.contains_key(&r.relative))
            .map(|r| r.relative.clone())
            .collect()
    }

    /// Fail with [`SyncError::GuardTripped`] when there are more new files
    /// than the threshold allows and `force` is off.
    pub fn check_guard(&self, new_files: &BTreeSet<RelativePath>) -> Result<(), SyncError> {
        if new_files.len() <= self.threshold {
            return Ok(());
        }
        if self.force {
            tracing::info!(
                "force flag detected; syncing {} new files (threshold {})",
                new_files.len(),
                self.threshold
            );
            return Ok(());
        }
        Err(SyncError::GuardTripped {
            count: new_files.len(),
            threshold: self.threshold,
            preview: new_files
                .iter()
                .take(GUARD_PREVIEW_LEN)
                .map(|p| p.0.clone())
                .collect(),
        })
    }

    /// Run the guard, then hash every record and compare against `cache`.
    ///
    /// Files that cannot be read are listed in [`SyncPlan::unreadable`]
    /// rather than failing the plan.
    pub fn plan(&self, records: Vec<FileRecord>, cache: &Cache) -> Result<SyncPlan, SyncError> {
        let new_files = Self::new_files(&records, cache);
        self.check_guard(&new_files)?;

        let mut plan = SyncPlan {
            new_files,
            ..SyncPlan::default()
        };
        for record in records {
            let hash = match hash_file(self.algorithm, &record.absolute) {
                Ok(hash) => hash,
                Err(err) => {
                    tracing::warn!("cannot read {}: {err}", record.relative);
                    plan.unreadable.push(UnreadableFile {
                        record,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            match cache.get(&record.relative) {
                Some(stored) if stored == &hash => {
                    tracing::debug!("unchanged: {}", record.relative);
                    plan.unchanged.insert(record.relative);
                }
                _ => plan.changed.push(PlannedUpload { record, hash }),
            }
        }
        plan.changed
            .sort_by(|a, b| a.record.relative.cmp(&b.record.relative));
        plan.unreadable
            .sort_by(|a, b| a.record.relative.cmp(&b.record.relative));
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    use crate::hash::hash_bytes;

    fn record(root: &Path, rel: &str, content: &str) -> FileRecord {
        let relative = RelativePath::from(rel);
        let absolute = relative.to_path(root);
        fs::create_dir_all(absolute.parent().unwrap()).unwrap();
        fs::write(&absolute, content).unwrap();
        FileRecord::new(relative, absolute)
    }

    fn md5(content: &str) -> String {
        hash_bytes(HashAlgorithm::Md5, content.as_bytes())
    }

    #[test]
    fn absent_and_mismatched_entries_are_changed() {
        let tmp = TempDir::new().unwrap();
        let records = vec![
            record(tmp.path(), "same.html", "same"),
            record(tmp.path(), "edited.html", "new body"),
            record(tmp.path(), "fresh.html", "fresh"),
        ];
        let mut cache = Cache::new();
        cache.insert("same.html".into(), md5("same"));
        cache.insert("edited.html".into(), md5("old body"));

        let plan = DiffEngine::new(HashAlgorithm::Md5, 10, false)
            .plan(records, &cache)
            .unwrap();

        let changed: Vec<_> = plan
            .changed
            .iter()
            .map(|u| u.record.relative.as_str())
            .collect();
        assert_eq!(changed, vec!["edited.html", "fresh.html"]);
        assert!(plan.unchanged.contains("same.html"));
        assert_eq!(plan.new_files.len(), 1);
        assert_eq!(plan.changed[0].hash, md5("new body"));
    }

    #[test]
    fn guard_trips_above_threshold_with_sorted_preview() {
        let tmp = TempDir::new().unwrap();
        let records: Vec<_> = (0..15)
            .rev()
            .map(|i| record(tmp.path(), &format!("page{i:02}.html"), "x"))
            .collect();

        let err = DiffEngine::new(HashAlgorithm::Md5, 10, false)
            .plan(records, &Cache::new())
            .unwrap_err();
        match err {
            SyncError::GuardTripped {
                count,
                threshold,
                preview,
            } => {
                assert_eq!(count, 15);
                assert_eq!(threshold, 10);
                assert_eq!(
                    preview,
                    vec![
                        "page00.html",
                        "page01.html",
                        "page02.html",
                        "page03.html",
                        "page04.html"
                    ]
                );
            }
            other => panic!("expected guard trip, got {other:?}"),
        }
    }

    #[test]
    fn guard_allows_exactly_threshold_new_files() {
        let tmp = TempDir::new().unwrap();
        let records: Vec<_> = (0..10)
            .map(|i| record(tmp.path(), &format!("p{i}.html"), "x"))
            .collect();
        let plan = DiffEngine::new(HashAlgorithm::Md5, 10, false)
            .plan(records, &Cache::new())
            .unwrap();
        assert_eq!(plan.changed.len(), 10);
    }

    #[test]
    fn force_bypasses_guard() {
        let tmp = TempDir::new().unwrap();
        let records: Vec<_> = (0..15)
            .map(|i| record(tmp.path(), &format!("p{i}.html"), "x"))
            .collect();
        let plan = DiffEngine::new(HashAlgorithm::Md5, 10, true)
            .plan(records, &Cache::new())
            .unwrap();
        assert_eq!(plan.changed.len(), 15);
    }

    #[test]
    fn changed_existing_files_do_not_count_as_new() {
        let tmp = TempDir::new().unwrap();
        let mut cache = Cache::new();
        let records: Vec<_> = (0..20)
            .map(|i| {
                let rel = format!("p{i}.html");
                cache.insert(RelativePath::from(rel.as_str()), md5("old"));
                record(tmp.path(), &rel, "new")
            })
            .collect();
        let plan = DiffEngine::new(HashAlgorithm::Md5, 10, false)
            .plan(records, &cache)
            .unwrap();
        assert!(plan.new_files.is_empty());
        assert_eq!(plan.changed.len(), 20);
    }

    #[test]
    fn unreadable_files_are_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let good = record(tmp.path(), "ok.html", "ok");
        let gone = FileRecord::new("gone.html".into(), tmp.path().join("gone.html"));
        let plan = DiffEngine::new(HashAlgorithm::Md5, 10, false)
            .plan(vec![good, gone], &Cache::new())
            .unwrap();
        assert_eq!(plan.changed.len(), 1);
        assert_eq!(plan.unreadable.len(), 1);
        assert_eq!(plan.unreadable[0].record.relative.as_str(), "gone.html");
    }
}
