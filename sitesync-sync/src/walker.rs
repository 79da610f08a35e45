//! Local tree enumeration under the ignore rules.
//!
//! Excluded directories are pruned before they are entered, so nothing
//! below them is ever read. Files named like the cache file are skipped at
//! every depth. Files whose relative path contains a tab or line break are
//! reported as errors instead of records. Enumeration order is unspecified.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use sitesync_core::{FileRecord, IgnoreMatcher, RelativePath};

use crate::error::SyncError;

/// A restartable walk over the non-excluded regular files of a root.
pub struct TreeWalker {
    root: PathBuf,
    matcher: IgnoreMatcher,
    skip_name: String,
}

impl TreeWalker {
    pub fn new(root: &Path, matcher: IgnoreMatcher, skip_name: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            matcher,
            skip_name: skip_name.to_owned(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn matcher(&self) -> &IgnoreMatcher {
        &self.matcher
    }

    /// Start a fresh walk. Each call re-reads the filesystem.
    ///
    /// Errors for individual entries (permission denied, vanished files)
    /// are yielded in place; the walk continues past them.
    pub fn files(&self) -> impl Iterator<Item = Result<FileRecord, SyncError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| self.keep(entry))
            .filter_map(move |entry| match entry {
                Ok(entry) if is_regular_file(&entry) => {
                    let relative = RelativePath::from_path(&self.root, entry.path())?;
                    if !relative.fits_cache_line() {
                        return Some(Err(SyncError::UnsupportedName { path: relative.0 }));
                    }
                    Some(Ok(FileRecord::new(relative, entry.into_path())))
                }
                Ok(_) => None,
                Err(err) => Some(Err(SyncError::Walk(err))),
            })
    }

    /// Collect one walk, splitting records from per-entry errors.
    pub fn walk(&self) -> (Vec<FileRecord>, Vec<SyncError>) {
        let mut records = Vec::new();
        let mut errors = Vec::new();
        for item in self.files() {
            match item {
                Ok(record) => records.push(record),
                Err(err) => errors.push(err),
            }
        }
        (records, errors)
    }

    fn keep(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if !entry.file_type().is_dir() && entry.file_name() == self.skip_name.as_str() {
            return false;
        }
        match RelativePath::from_path(&self.root, entry.path()) {
            Some(relative) => !self.matcher.should_ignore(relative.as_str()),
            None => false,
        }
    }
}

/// Regular files, plus symlinks that resolve to one. Directory symlinks are
/// not followed.
fn is_regular_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = RelativePath::from(rel).to_path(root);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    fn walked(root: &Path, matcher: &IgnoreMatcher) -> BTreeSet<String> {
        let (records, errors) = TreeWalker::new(root, matcher.clone(), "cache.txt").walk();
        assert!(errors.is_empty(), "unexpected walk errors: {errors:?}");
        records.into_iter().map(|r| r.relative.0).collect()
    }

    #[test]
    fn yields_every_regular_file_with_posix_paths() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "index.html");
        touch(tmp.path(), "about/index.html");
        touch(tmp.path(), "css/deep/site.css");
        fs::create_dir_all(tmp.path().join("empty")).unwrap();

        let files = walked(tmp.path(), &IgnoreMatcher::empty());
        let expected: BTreeSet<String> = ["index.html", "about/index.html", "css/deep/site.css"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(files, expected);
    }

    #[test]
    fn skips_cache_file_at_any_depth() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "cache.txt");
        touch(tmp.path(), "nested/cache.txt");
        touch(tmp.path(), "page.html");

        let files = walked(tmp.path(), &IgnoreMatcher::empty());
        assert_eq!(files.into_iter().collect::<Vec<_>>(), vec!["page.html"]);
    }

    #[test]
    fn ignored_directories_are_pruned() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "node_modules/foo.js");
        touch(tmp.path(), "node_modules/pkg/bar.js");
        touch(tmp.path(), "index.html");
        touch(tmp.path(), "notes.log");

        let matcher = IgnoreMatcher::parse("node_modules/\n*.log\n").unwrap();
        let files = walked(tmp.path(), &matcher);
        assert_eq!(files.into_iter().collect::<Vec<_>>(), vec!["index.html"]);
    }

    #[test]
    #[cfg(unix)]
    fn pruned_directories_are_never_opened() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "private/secret.txt");
        touch(tmp.path(), "index.html");
        let private = tmp.path().join("private");
        fs::set_permissions(&private, fs::Permissions::from_mode(0o000)).unwrap();

        let matcher = IgnoreMatcher::parse("private/\n").unwrap();
        let (records, errors) = TreeWalker::new(tmp.path(), matcher, "cache.txt").walk();

        fs::set_permissions(&private, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(errors.is_empty(), "pruned dir must not be read: {errors:?}");
        assert_eq!(records.len(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn names_with_line_breaks_are_reported_not_yielded() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a\nb.html"), "x").unwrap();
        fs::write(tmp.path().join("tab\there.html"), "x").unwrap();
        touch(tmp.path(), "ok.html");

        let (records, errors) =
            TreeWalker::new(tmp.path(), IgnoreMatcher::empty(), "cache.txt").walk();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative.as_str(), "ok.html");
        let mut rejected: Vec<_> = errors
            .iter()
            .map(|e| match e {
                SyncError::UnsupportedName { path } => path.clone(),
                other => panic!("unexpected error {other:?}"),
            })
            .collect();
        rejected.sort();
        assert_eq!(rejected, vec!["a\nb.html", "tab\there.html"]);
    }

    #[test]
    fn walk_is_restartable() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.html");
        let walker = TreeWalker::new(tmp.path(), IgnoreMatcher::empty(), "cache.txt");
        assert_eq!(walker.files().count(), 1);
        touch(tmp.path(), "b.html");
        assert_eq!(walker.files().count(), 2);
    }
}
