//! A bucket emulated as a directory tree under the state root.
//!
//! Object `k` of bucket `b` is stored at `<root>/buckets/<b>/<k>`; its
//! metadata (content type, upload time) at `<root>/meta/<b>/<k>.json`.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use sitesync_sync::{CollaboratorError, ObjectLister, Uploader};

use crate::error::{io_err, BackendError};
use crate::paths;

const TMP_SUFFIX: &str = ".sitesync-tmp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub key: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DirectoryBucket {
    root: PathBuf,
    bucket: String,
}

impl DirectoryBucket {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Result<Self, BackendError> {
        let bucket = bucket.into();
        if !paths::is_plain_name(&bucket) {
            return Err(BackendError::InvalidBucket(bucket));
        }
        Ok(Self {
            root: root.into(),
            bucket,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object_path(&self, key: &str) -> Result<PathBuf, BackendError> {
        Ok(paths::bucket_dir(&self.root, &self.bucket).join(checked_key(key)?))
    }

    fn meta_path(&self, key: &str) -> Result<PathBuf, BackendError> {
        let rel = checked_key(key)?;
        let mut name = rel.as_os_str().to_owned();
        name.push(".json");
        Ok(paths::meta_dir(&self.root, &self.bucket).join(name))
    }

    /// Copy `local` into the bucket under `key`, then record its metadata.
    pub fn put(&self, local: &Path, key: &str, content_type: &str) -> Result<ObjectMeta, BackendError> {
        let dest = self.object_path(key)?;
        let size = copy_atomic(local, &dest)?;
        let meta = ObjectMeta {
            key: key.to_owned(),
            content_type: content_type.to_owned(),
            size,
            uploaded_at: Utc::now(),
        };
        let meta_path = self.meta_path(key)?;
        write_atomic(&meta_path, &serde_json::to_vec_pretty(&meta)?)?;
        debug!("stored {} ({} bytes) in {}", key, size, self.bucket);
        Ok(meta)
    }

    pub fn head(&self, key: &str) -> Result<Option<ObjectMeta>, BackendError> {
        let path = self.meta_path(key)?;
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&path, e)),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub fn keys(&self) -> Result<BTreeSet<String>, BackendError> {
        let dir = paths::bucket_dir(&self.root, &self.bucket);
        if !dir.exists() {
            return Ok(BTreeSet::new());
        }
        let mut keys = BTreeSet::new();
        for entry in WalkDir::new(&dir).follow_links(false) {
            let entry = entry?;
            if !entry.file_type().is_file() || is_tmp(entry.path()) {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&dir) {
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                keys.insert(key);
            }
        }
        Ok(keys)
    }
}

impl Uploader for DirectoryBucket {
    fn upload(
        &self,
        local_path: &Path,
        remote_key: &str,
        content_type: &str,
    ) -> Result<(), CollaboratorError> {
        self.put(local_path, remote_key, content_type)?;
        Ok(())
    }
}

/// Lists any bucket under the same state root.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn bucket(&self, name: &str) -> Result<DirectoryBucket, BackendError> {
        DirectoryBucket::new(self.root.clone(), name)
    }
}

impl ObjectLister for DirectoryStore {
    fn list(&self, bucket: &str) -> Result<BTreeSet<String>, CollaboratorError> {
        Ok(self.bucket(bucket)?.keys()?)
    }
}

/// Object keys are relative, `/`-separated, and may not climb out of the
/// bucket. `\` is a separator only on Windows.
fn checked_key(key: &str) -> Result<PathBuf, BackendError> {
    let path = Path::new(key);
    if key.is_empty() || (cfg!(windows) && key.contains('\\')) {
        return Err(BackendError::InvalidKey(key.to_owned()));
    }
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return Err(BackendError::InvalidKey(key.to_owned())),
        }
    }
    if out.as_os_str().is_empty() {
        return Err(BackendError::InvalidKey(key.to_owned()));
    }
    Ok(out)
}

fn tmp_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

fn is_tmp(path: &Path) -> bool {
    path
        .file_name()
        .is_some_and(|n| n.to_string_lossy().ends_with(TMP_SUFFIX))
}

fn ensure_parent(dest: &Path) -> Result<(), BackendError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    Ok(())
}

fn copy_atomic(src: &Path, dest: &Path) -> Result<u64, BackendError> {
    ensure_parent(dest)?;
    let tmp = tmp_path(dest);
    let size = fs::copy(src, &tmp).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        io_err(src, e)
    })?;
    fs::rename(&tmp, dest).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        io_err(dest, e)
    })?;
    Ok(size)
}

fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), BackendError> {
    ensure_parent(dest)?;
    let tmp = tmp_path(dest);
    fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
    fs::rename(&tmp, dest).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        io_err(dest, e)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let p = dir.path().join(name);
        fs::write(&p, body).expect("write source");
        p
    }

    #[test]
    fn put_copies_and_records_meta() {
        let state = TempDir::new().expect("tempdir");
        let site = TempDir::new().expect("tempdir");
        let src = source(&site, "index.html", "<h1>hi</h1>");
        let bucket = DirectoryBucket::new(state.path(), "www").expect("bucket");

        bucket.put(&src, "about/index.html", "text/html").expect("put");

        let stored = state.path().join("buckets/www/about/index.html");
        assert_eq!(fs::read_to_string(stored).expect("read"), "<h1>hi</h1>");
        let meta = bucket.head("about/index.html").expect("head").expect("meta");
        assert_eq!(meta.content_type, "text/html");
        assert_eq!(meta.size, 11);
    }

    #[test]
    fn keys_lists_nested_objects_only() {
        let state = TempDir::new().expect("tempdir");
        let site = TempDir::new().expect("tempdir");
        let src = source(&site, "a.css", "x");
        let bucket = DirectoryBucket::new(state.path(), "www").expect("bucket");
        bucket.put(&src, "a.css", "text/css").expect("put");
        bucket.put(&src, "css/b.css", "text/css").expect("put");

        let keys: Vec<_> = bucket.keys().expect("keys").into_iter().collect();
        assert_eq!(keys, vec!["a.css", "css/b.css"]);
    }

    #[test]
    fn empty_bucket_lists_nothing() {
        let state = TempDir::new().expect("tempdir");
        let store = DirectoryStore::new(state.path());
        assert!(store.list("nothing-here").expect("list").is_empty());
    }

    #[test]
    fn rejects_escaping_keys() {
        let state = TempDir::new().expect("tempdir");
        let bucket = DirectoryBucket::new(state.path(), "www").expect("bucket");
        for key in ["../etc/passwd", "/abs", "a/../../b", ""] {
            assert!(
                matches!(bucket.object_path(key), Err(BackendError::InvalidKey(_))),
                "{key} should be rejected"
            );
        }
    }

    #[test]
    #[cfg(unix)]
    fn backslash_is_part_of_the_object_name() {
        let state = TempDir::new().expect("tempdir");
        let bucket = DirectoryBucket::new(state.path(), "www").expect("bucket");
        let path = bucket.object_path("a\\b.html").expect("key");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("a\\b.html"));
    }

    #[test]
    fn rejects_bad_bucket_names() {
        let state = TempDir::new().expect("tempdir");
        assert!(DirectoryBucket::new(state.path(), "a/b").is_err());
        assert!(DirectoryBucket::new(state.path(), "..").is_err());
        assert!(DirectoryBucket::new(state.path(), "").is_err());
    }

    #[test]
    fn upload_failure_surfaces_as_collaborator_error() {
        let state = TempDir::new().expect("tempdir");
        let bucket = DirectoryBucket::new(state.path(), "www").expect("bucket");
        let err = bucket
            .upload(Path::new("/definitely/missing/file"), "x.html", "text/html")
            .unwrap_err();
        assert!(err.0.contains("missing"), "{err}");
    }
}
