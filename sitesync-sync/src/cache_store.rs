//! Cache store: the persisted path → content-hash map.
//!
//! The cache file is plain text, one `<relative-posix-path>\t<hex-hash>`
//! line per entry. It always reflects the last completed run: it is read
//! once at the start of a run and rewritten once at the end, using the same
//! atomic `.tmp` + rename pattern as the rest of the workspace.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sitesync_core::{CacheEntry, IgnoreMatcher, RelativePath};

use crate::error::{io_err, SyncError};

/// In-memory cache: relative path → hex digest of the last synced content.
pub type Cache = HashMap<RelativePath, String>;

/// Load the cache at `path`.
///
/// Returns an empty cache if the file does not exist. On Windows,
/// backslash-separated keys written by older runs are normalised to `/`.
pub fn load(path: &Path) -> Result<Cache, SyncError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Cache::new()),
        Err(err) => return Err(io_err(path, err)),
    };
    parse(path, &contents)
}

fn parse(path: &Path, contents: &str) -> Result<Cache, SyncError> {
    let mut cache = Cache::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((key, hash)) = line.split_once('\t') else {
            return Err(SyncError::MalformedCache {
                path: path.to_path_buf(),
                line: index + 1,
                content: line.to_owned(),
            });
        };
        cache.insert(stored_key(key), hash.trim().to_owned());
    }
    Ok(cache)
}

#[cfg(windows)]
fn stored_key(key: &str) -> RelativePath {
    RelativePath::from(key.replace('\\', "/"))
}

// `\` is an ordinary file-name character here.
#[cfg(not(windows))]
fn stored_key(key: &str) -> RelativePath {
    RelativePath::from(key)
}

/// Drop entries whose file no longer exists under `root` or that an ignore
/// rule now excludes. Returns the dropped paths, sorted.
pub fn reconcile(cache: &mut Cache, root: &Path, matcher: &IgnoreMatcher) -> Vec<RelativePath> {
    let mut pruned = Vec::new();
    cache.retain(|key, _| {
        let keep = !matcher.should_ignore(key.as_str()) && key.to_path(root).is_file();
        if !keep {
            tracing::debug!("pruning cache entry: {key}");
            pruned.push(key.clone());
        }
        keep
    });
    pruned.sort();
    pruned
}

/// Cache entries sorted by path. Keys that cannot be written as a single
/// line are left out.
pub fn entries(cache: &Cache) -> Vec<CacheEntry> {
    let mut entries: Vec<CacheEntry> = cache
        .iter()
        .filter(|(path, _)| path.fits_cache_line())
        .map(|(path, hash)| CacheEntry {
            path: path.clone(),
            hash: hash.clone(),
        })
        .collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

/// Serialise the whole cache, one `path\thash\n` line per entry.
pub fn render(cache: &Cache) -> String {
    let mut out = String::new();
    for entry in entries(cache) {
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out
}

/// Save the cache to `path` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`; a failed rename leaves
/// the previous cache file intact and removes the temporary.
pub fn save(cache: &Cache, path: &Path) -> Result<(), SyncError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, render(cache)).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// `<path>.tmp`
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
