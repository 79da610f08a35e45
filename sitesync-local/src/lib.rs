//! # sitesync-local
//!
//! Filesystem-backed stand-ins for the object store and the CDN, rooted at
//! `$SITESYNC_HOME` (default `~/.sitesync`):
//!
//! ```text
//! <root>/buckets/<bucket>/<key>         uploaded objects
//! <root>/meta/<bucket>/<key>.json       content type, size, upload time
//! <root>/invalidations/<distro>.jsonl   one line per invalidation request
//! ```

pub mod bucket;
pub mod error;
pub mod journal;
pub mod paths;

pub use bucket::{DirectoryBucket, DirectoryStore, ObjectMeta};
pub use error::BackendError;
pub use journal::{JournalEntry, JournalInvalidator};
