//! Content digests used for change detection.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use md5::Md5;
use sha2::{Digest, Sha256};

use sitesync_core::HashAlgorithm;

use crate::error::{io_err, SyncError};

const READ_CHUNK: usize = 64 * 1024;

/// Hex digest of raw `bytes`.
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Md5 => hex::encode(Md5::digest(bytes)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
    }
}

/// Hex digest of the raw bytes of the file at `path`, streamed.
pub fn hash_file(algorithm: HashAlgorithm, path: &Path) -> Result<String, SyncError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let reader = BufReader::new(file);
    match algorithm {
        HashAlgorithm::Md5 => digest_reader::<Md5, _>(reader, path),
        HashAlgorithm::Sha256 => digest_reader::<Sha256, _>(reader, path),
    }
}

fn digest_reader<D: Digest, R: Read>(mut reader: R, path: &Path) -> Result<String, SyncError> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut buf).map_err(|e| io_err(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
