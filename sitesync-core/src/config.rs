//! Run configuration.
//!
//! [`SyncConfig`] is what the orchestrator consumes. It is assembled from
//! defaults, an optional YAML [`Settings`] file and command-line overrides,
//! in that order of precedence (later wins).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CACHE_FILE_NAME, CONFIG_FILE_NAME, DEFAULT_INDEX_DOCUMENT, DEFAULT_NEW_FILE_THRESHOLD,
    IGNORE_FILE_NAME,
};
use crate::error::{io_err, ConfigError};
use crate::types::HashAlgorithm;

/// Everything one sync run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub local_root: PathBuf,
    pub bucket: String,
    /// Raw distribution id; validated when the run starts.
    pub distribution_id: Option<String>,
    /// Bypass the new-file guard.
    pub force: bool,
    pub new_file_threshold: usize,
    pub cache_path: PathBuf,
    pub ignore_file_name: String,
    pub index_document: String,
    pub hash_algorithm: HashAlgorithm,
    /// Upload parallelism; `1` keeps the run strictly sequential.
    pub jobs: usize,
    pub dry_run: bool,
}

impl SyncConfig {
    /// Defaults for syncing `local_root` into `bucket`, with the cache file
    /// in the current working directory.
    pub fn new(local_root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            local_root: local_root.into(),
            bucket: bucket.into(),
            distribution_id: None,
            force: false,
            new_file_threshold: DEFAULT_NEW_FILE_THRESHOLD,
            cache_path: PathBuf::from(CACHE_FILE_NAME),
            ignore_file_name: IGNORE_FILE_NAME.to_owned(),
            index_document: DEFAULT_INDEX_DOCUMENT.to_owned(),
            hash_algorithm: HashAlgorithm::default(),
            jobs: 1,
            dry_run: false,
        }
    }

    /// Overlay values present in a settings file.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        if let Some(threshold) = settings.new_file_threshold {
            self.new_file_threshold = threshold;
        }
        if let Some(path) = &settings.cache_file {
            self.cache_path = path.clone();
        }
        if let Some(name) = &settings.ignore_file {
            self.ignore_file_name = name.clone();
        }
        if let Some(index) = &settings.index_document {
            self.index_document = index.clone();
        }
        if let Some(algorithm) = settings.hash_algorithm {
            self.hash_algorithm = algorithm;
        }
        if let Some(jobs) = settings.jobs {
            self.jobs = jobs.max(1);
        }
        if self.distribution_id.is_none() {
            self.distribution_id = settings.distribution_id.clone();
        }
        self
    }

    /// `<local_root>/<ignore_file_name>`
    pub fn ignore_file_path(&self) -> PathBuf {
        self.local_root.join(&self.ignore_file_name)
    }

    /// Bare file name of the cache, skipped by the walker at any depth.
    pub fn cache_file_name(&self) -> &str {
        self.cache_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(CACHE_FILE_NAME)
    }
}

/// Optional on-disk settings (`sitesync.yaml`). Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_file_threshold: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_algorithm: Option<HashAlgorithm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_id: Option<String>,
}

impl Settings {
    /// `<dir>/sitesync.yaml`
    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    /// Load settings from `path`. A missing file yields the defaults.
    ///
    /// Returns [`ConfigError::Parse`] (with path) on malformed YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(io_err(path, err)),
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_legacy_tool() {
        let cfg = SyncConfig::new("/site", "bucket");
        assert_eq!(cfg.new_file_threshold, 10);
        assert_eq!(cfg.cache_path, PathBuf::from("cache.txt"));
        assert_eq!(cfg.cache_file_name(), "cache.txt");
        assert_eq!(cfg.ignore_file_path(), PathBuf::from("/site").join(".s3ignore"));
        assert_eq!(cfg.hash_algorithm, HashAlgorithm::Md5);
        assert_eq!(cfg.jobs, 1);
        assert!(!cfg.force);
    }

    #[test]
    fn settings_overlay_only_present_fields() {
        let settings = Settings {
            new_file_threshold: Some(25),
            hash_algorithm: Some(HashAlgorithm::Sha256),
            jobs: Some(0),
            ..Settings::default()
        };
        let cfg = SyncConfig::new("/site", "bucket").with_settings(&settings);
        assert_eq!(cfg.new_file_threshold, 25);
        assert_eq!(cfg.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(cfg.jobs, 1, "jobs is clamped to at least one worker");
        assert_eq!(cfg.index_document, "index.html");
    }

    #[test]
    fn explicit_distribution_id_wins_over_settings() {
        let settings = Settings {
            distribution_id: Some("FROMSETTINGS1".into()),
            ..Settings::default()
        };
        let mut cfg = SyncConfig::new("/site", "bucket");
        cfg.distribution_id = Some("FROMCLIFLAG12".into());
        let cfg = cfg.with_settings(&settings);
        assert_eq!(cfg.distribution_id.as_deref(), Some("FROMCLIFLAG12"));
    }

    #[test]
    fn missing_settings_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(&Settings::default_path(tmp.path())).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
