//! CDN invalidation batches for changed paths.
//!
//! Every changed key becomes `/<key>`. Keys whose final segment is the index
//! document also produce the directory URL (`/about/index.html` →
//! `/about/`), since a CDN may have cached either form. Aliases follow the
//! explicit paths, in the same order.

use std::collections::HashSet;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use sitesync_core::{
    constants::{REQUEST_TOKEN_PREFIX, REQUEST_TOKEN_SUFFIX_LEN},
    InvalidationBatch, RelativePath,
};

const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Builds [`InvalidationBatch`]es.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationBatcher {
    index_document: String,
}

impl InvalidationBatcher {
    pub fn new(index_document: impl Into<String>) -> Self {
        Self {
            index_document: index_document.into(),
        }
    }

    /// URL paths to invalidate for `changed`, without duplicates.
    pub fn paths<'a, I>(&self, changed: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a RelativePath>,
    {
        let mut seen = HashSet::new();
        let mut explicit = Vec::new();
        let mut aliases = Vec::new();
        for key in changed {
            let url = key.url_path();
            if key.file_name() == self.index_document {
                let alias = url[..url.len() - self.index_document.len()].to_owned();
                aliases.push(alias);
            }
            explicit.push(url);
        }
        explicit
            .into_iter()
            .chain(aliases)
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }

    /// A batch for `changed` with a fresh request token.
    pub fn batch<'a, I>(&self, changed: I) -> InvalidationBatch
    where
        I: IntoIterator<Item = &'a RelativePath>,
    {
        InvalidationBatch {
            paths: self.paths(changed),
            request_token: request_token(&mut rand::thread_rng()),
        }
    }
}

/// `DR` followed by 26 random characters from `A-Z0-9`.
pub fn request_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    let index = Uniform::from(0..TOKEN_ALPHABET.len());
    let mut token = String::with_capacity(REQUEST_TOKEN_PREFIX.len() + REQUEST_TOKEN_SUFFIX_LEN);
    token.push_str(REQUEST_TOKEN_PREFIX);
    for _ in 0..REQUEST_TOKEN_SUFFIX_LEN {
        token.push(TOKEN_ALPHABET[index.sample(rng)] as char);
    }
    token
}
