//! File fingerprints needed by the upload protocol: SHA-256 object id,
//! size, and the leading sample the Hub uses to pick an upload mode.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{TransferError, TransferResult};

const BUF_SIZE: usize = 64 * 1024;

/// Bytes of file head sent with a preupload request.
pub const SAMPLE_LEN: usize = 512;

/// SHA-256 (lowercase hex) and length of a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub sha256: String,
    pub size: u64,
}

/// Hashes `path` in fixed-size chunks so large model files stay out of memory.
pub fn digest_path(path: &Path) -> TransferResult<FileDigest> {
    let mut f = File::open(path).map_err(|e| TransferError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    let mut size = 0u64;
    loop {
        let n = f.read(&mut buf).map_err(|e| TransferError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok(FileDigest {
        sha256: hex::encode(hasher.finalize()),
        size,
    })
}

/// First [`SAMPLE_LEN`] bytes of `path` (fewer for short files).
pub fn read_sample(path: &Path) -> TransferResult<Vec<u8>> {
    let f = File::open(path).map_err(|e| TransferError::io(path, e))?;
    let mut sample = Vec::with_capacity(SAMPLE_LEN);
    f.take(SAMPLE_LEN as u64)
        .read_to_end(&mut sample)
        .map_err(|e| TransferError::io(path, e))?;
    Ok(sample)
}
