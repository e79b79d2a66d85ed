//! Large-file transfer: git-lfs batch negotiation, then basic or multipart PUTs.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::checksum::FileDigest;
use crate::error::{NetworkFailure, TransferError, TransferResult};
use crate::http::Headers;

use super::wire::{
    BatchAction, BatchRequest, BatchResponse, CompletedPart, CompletionRequest, VerifyRequest,
};
use super::Uploader;

const LFS_MEDIA_TYPE: &str = "application/vnd.git-lfs+json";

fn lfs_headers() -> Headers {
    let mut h = Headers::new();
    h.insert("Accept".to_string(), LFS_MEDIA_TYPE.to_string());
    h.insert("Content-Type".to_string(), LFS_MEDIA_TYPE.to_string());
    h
}

fn unexpected(url: &str, msg: impl Into<String>) -> TransferError {
    TransferError::network(url, NetworkFailure::UnexpectedBody(msg.into()))
}

impl Uploader<'_> {
    /// Stores `local` as an LFS object unless the Hub already has it.
    pub(super) fn push_lfs_object(&self, local: &Path, digest: &FileDigest) -> TransferResult<()> {
        let batch_url = self.lfs_batch_url()?;
        let body = serde_json::to_vec(&BatchRequest::upload(
            &digest.sha256,
            digest.size,
            &self.target.repo.revision,
        ))
        .map_err(|e| unexpected(&batch_url, e.to_string()))?;

        let mut headers = self.auth_headers();
        headers.extend(lfs_headers());
        let response = self.client.post(&batch_url, &headers, &body)?;
        let response = self.check(response, &batch_url)?;
        let batch: BatchResponse = response.json(&batch_url)?;

        let object = batch
            .objects
            .into_iter()
            .find(|o| o.oid == digest.sha256)
            .ok_or_else(|| unexpected(&batch_url, "batch response lacks our object"))?;
        if let Some(err) = object.error {
            if err.code == 401 || err.code == 403 {
                return Err(TransferError::Auth {
                    url: batch_url,
                    status: err.code,
                });
            }
            return Err(unexpected(
                &batch_url,
                format!("lfs object rejected ({}): {}", err.code, err.message),
            ));
        }

        let Some(actions) = object.actions else {
            tracing::info!(oid = %digest.sha256, "lfs object already present");
            return Ok(());
        };
        if let Some(upload) = &actions.upload {
            let multipart = batch.transfer.as_deref() == Some("multipart")
                || upload.header.contains_key("chunk_size");
            if multipart {
                self.put_multipart(local, digest, upload)?;
            } else {
                self.put_basic(local, digest, upload)?;
            }
        }
        if let Some(verify) = &actions.verify {
            self.verify(digest, verify)?;
        }
        Ok(())
    }

    fn put_basic(&self, local: &Path, digest: &FileDigest, action: &BatchAction) -> TransferResult<()> {
        tracing::info!(size = digest.size, "lfs basic upload");
        let mut file = File::open(local).map_err(|e| TransferError::io(local, e))?;
        self.client
            .put(&action.href, &action.header, &mut file, digest.size)?
            .ensure_success(&action.href)?;
        Ok(())
    }

    /// Sends each part once, in order, then posts the collected ETags to the
    /// completion href. A failed part fails the whole upload.
    fn put_multipart(
        &self,
        local: &Path,
        digest: &FileDigest,
        action: &BatchAction,
    ) -> TransferResult<()> {
        let chunk_size = action
            .header
            .get("chunk_size")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .ok_or_else(|| unexpected(&action.href, "multipart upload without chunk_size"))?;

        let mut parts: Vec<(u32, &String)> = action
            .header
            .iter()
            .filter_map(|(k, v)| k.parse::<u32>().ok().map(|n| (n, v)))
            .collect();
        parts.sort_by_key(|(n, _)| *n);
        let expected = digest.size.div_ceil(chunk_size);
        if parts.len() as u64 != expected {
            return Err(unexpected(
                &action.href,
                format!("expected {} part URLs, got {}", expected, parts.len()),
            ));
        }
        tracing::info!(parts = parts.len(), chunk_size, "lfs multipart upload");

        let mut file = File::open(local).map_err(|e| TransferError::io(local, e))?;
        let mut completed = Vec::with_capacity(parts.len());
        for (index, (number, part_url)) in parts.into_iter().enumerate() {
            let offset = index as u64 * chunk_size;
            let len = chunk_size.min(digest.size - offset);
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| TransferError::io(local, e))?;
            let mut chunk = (&mut file).take(len);
            let response = self
                .client
                .put(part_url, &Headers::new(), &mut chunk, len)?
                .ensure_success(part_url)?;
            let etag = response
                .head
                .header("etag")
                .ok_or_else(|| unexpected(part_url, "part upload returned no ETag"))?;
            completed.push(CompletedPart {
                part_number: number,
                etag: etag.to_string(),
            });
        }

        let body = serde_json::to_vec(&CompletionRequest {
            oid: &digest.sha256,
            parts: completed,
        })
        .map_err(|e| unexpected(&action.href, e.to_string()))?;
        self.client
            .post(&action.href, &lfs_headers(), &body)?
            .ensure_success(&action.href)?;
        Ok(())
    }

    fn verify(&self, digest: &FileDigest, action: &BatchAction) -> TransferResult<()> {
        let body = serde_json::to_vec(&VerifyRequest {
            oid: &digest.sha256,
            size: digest.size,
        })
        .map_err(|e| unexpected(&action.href, e.to_string()))?;
        let mut headers = self.auth_headers();
        headers.extend(lfs_headers());
        headers.extend(action.header.clone());
        let response = self.client.post(&action.href, &headers, &body)?;
        self.check(response, &action.href)?;
        Ok(())
    }
}
