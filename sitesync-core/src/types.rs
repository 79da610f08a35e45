//! Domain types shared by the sync engine and its collaborators.
//!
//! Relative paths are always stored with `/` separators, whatever the host
//! path convention is.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DISTRIBUTION_ID_LEN;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A path relative to the local root, joined with forward slashes.
///
/// Doubles as the remote object key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelativePath(pub String);

impl RelativePath {
    /// Express `path` relative to `root`, or `None` when `path` is not
    /// beneath `root` (or is `root` itself).
    pub fn from_path(root: &Path, path: &Path) -> Option<Self> {
        let rel = path.strip_prefix(root).ok()?;
        let mut segments = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if segments.is_empty() {
            return None;
        }
        Some(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Rebuild the host path below `root`.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, seg| acc.join(seg))
    }

    /// Whether the key can be written as one `path\thash` cache line.
    /// Tabs and line breaks are legal in file names but not in the cache.
    pub fn fits_cache_line(&self) -> bool {
        !self.0.contains(['\t', '\n', '\r'])
    }

    /// Absolute URL path as seen by a CDN (`/a/b.html`).
    pub fn url_path(&self) -> String {
        format!("/{}", self.0)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RelativePath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RelativePath {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl Borrow<str> for RelativePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A validated CDN distribution identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistributionId(String);

impl DistributionId {
    /// Validate `raw`: it must be exactly [`DISTRIBUTION_ID_LEN`] characters.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let len = raw.chars().count();
        if len != DISTRIBUTION_ID_LEN {
            return Err(ConfigError::InvalidDistributionId {
                id: raw.to_owned(),
                len,
            });
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DistributionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DistributionId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Digest used for change detection. Not a security primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Default, so existing `cache.txt` files stay valid.
    #[default]
    Md5,
    Sha256,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Md5 => write!(f, "md5"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(format!(
                "unknown hash algorithm '{other}'; expected: md5, sha256"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One persisted cache line: `path\thash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: RelativePath,
    pub hash: String,
}

impl fmt::Display for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.path, self.hash)
    }
}

/// A regular file found under the local root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub relative: RelativePath,
    pub absolute: PathBuf,
    /// MIME type; filled in when the file is classified for upload.
    pub content_type: Option<String>,
}

impl FileRecord {
    pub fn new(relative: RelativePath, absolute: PathBuf) -> Self {
        Self {
            relative,
            absolute,
            content_type: None,
        }
    }
}

/// A changed file together with the digest it will be cached under once
/// its upload is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpload {
    pub record: FileRecord,
    pub hash: String,
}

/// A file that could not be hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableFile {
    pub record: FileRecord,
    pub reason: String,
}

/// Per-run diff outcome. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Files to upload, sorted by relative path.
    pub changed: Vec<PlannedUpload>,
    /// Paths whose content matches the cache.
    pub unchanged: BTreeSet<RelativePath>,
    /// Walked paths absent from the cache before this run.
    pub new_files: BTreeSet<RelativePath>,
    pub unreadable: Vec<UnreadableFile>,
}

impl SyncPlan {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// A CDN invalidation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationBatch {
    /// URL paths, each starting with `/`.
    pub paths: Vec<String>,
    /// Fresh per request; never reused.
    pub request_token: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
