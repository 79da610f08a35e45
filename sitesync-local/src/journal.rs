//! CDN invalidations recorded as an append-only JSON-lines journal, one file
//! per distribution under `<root>/invalidations/`.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use sitesync_core::constants::REQUEST_TOKEN_PREFIX;
use sitesync_core::{DistributionId, InvalidationBatch};
use sitesync_sync::{CdnInvalidator, CollaboratorError};

use crate::error::{io_err, BackendError};
use crate::paths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub distribution_id: String,
    pub caller_reference: String,
    pub paths: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct JournalInvalidator {
    root: PathBuf,
}

impl JournalInvalidator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/invalidations/<id>.jsonl`, refusing ids that are not a plain
    /// file name.
    fn journal_for(&self, distribution: &DistributionId) -> Result<PathBuf, BackendError> {
        let id = distribution.as_str();
        if !paths::is_plain_name(id) {
            return Err(BackendError::InvalidDistribution(id.to_owned()));
        }
        Ok(paths::journal_path(&self.root, id))
    }

    pub fn record(
        &self,
        distribution: &DistributionId,
        batch: &InvalidationBatch,
    ) -> Result<JournalEntry, BackendError> {
        let path = self.journal_for(distribution)?;
        let entry = JournalEntry {
            id: invalidation_id(&batch.request_token),
            distribution_id: distribution.as_str().to_owned(),
            caller_reference: batch.request_token.clone(),
            paths: batch.paths.clone(),
            created_at: Utc::now(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_err(&path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| io_err(&path, e))?;

        info!(
            "invalidation {} recorded for {} ({} paths)",
            entry.id,
            distribution,
            entry.paths.len()
        );
        Ok(entry)
    }

    /// Every recorded invalidation for `distribution`, oldest first.
    pub fn entries(&self, distribution: &DistributionId) -> Result<Vec<JournalEntry>, BackendError> {
        let path = self.journal_for(distribution)?;
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&path, e)),
        };
        let mut out = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| io_err(&path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            out.push(serde_json::from_str(&line)?);
        }
        Ok(out)
    }
}

impl CdnInvalidator for JournalInvalidator {
    fn invalidate(
        &self,
        distribution: &DistributionId,
        batch: &InvalidationBatch,
    ) -> Result<String, CollaboratorError> {
        Ok(self.record(distribution, batch)?.id)
    }
}

/// Ids look like CDN-issued ones: `I` followed by 13 token characters.
fn invalidation_id(token: &str) -> String {
    let body: String = token
        .strip_prefix(REQUEST_TOKEN_PREFIX)
        .unwrap_or(token)
        .chars()
        .take(13)
        .collect();
    format!("I{body}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
