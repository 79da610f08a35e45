//! Fixed names and limits shared by every sitesync crate.

/// Cache file name, resolved against the process working directory.
///
/// The walker skips any file with this name at any depth.
pub const CACHE_FILE_NAME: &str = "cache.txt";

/// Ignore file name, resolved against the local root.
pub const IGNORE_FILE_NAME: &str = ".s3ignore";

/// Optional settings file, resolved against the process working directory.
pub const CONFIG_FILE_NAME: &str = "sitesync.yaml";

pub const DEFAULT_NEW_FILE_THRESHOLD: usize = 10;

/// Number of new paths shown when the new-file guard trips.
pub const GUARD_PREVIEW_LEN: usize = 5;

/// CDN distribution identifiers are exactly this many characters.
pub const DISTRIBUTION_ID_LEN: usize = 13;

pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub const REQUEST_TOKEN_PREFIX: &str = "DR";
pub const REQUEST_TOKEN_SUFFIX_LEN: usize = 26;
