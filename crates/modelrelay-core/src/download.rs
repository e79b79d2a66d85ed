//! Downloader: single-stream GET written sequentially to disk.
//!
//! The body goes to `<dest>.part` and is renamed to `<dest>` only after the
//! whole body arrived, so a complete-looking file never survives a failure.
//! The `.part` file is left behind on failure for the caller to discard.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{NetworkFailure, TransferError, TransferResult};
use crate::http::{Flow, Headers, HttpClient};
use crate::naming;
use crate::resolver::ResolvedSource;

/// Snapshot handed to the progress callback after every chunk.
#[derive(Debug, Clone)]
pub struct Progress {
    pub bytes_done: u64,
    /// From `Content-Length`, when the server sent one.
    pub total_bytes: Option<u64>,
    pub elapsed_secs: f64,
}

impl Progress {
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Seconds remaining at the current rate; `None` when unknown.
    pub fn eta_secs(&self) -> Option<f64> {
        let total = self.total_bytes?;
        let remaining = total.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0], when the total is known.
    pub fn fraction(&self) -> Option<f64> {
        let total = self.total_bytes?;
        if total == 0 {
            return Some(1.0);
        }
        Some((self.bytes_done as f64 / total as f64).min(1.0))
    }
}

/// `<path>.part`
pub fn part_path(dest: &Path) -> PathBuf {
    let mut s: OsString = dest.as_os_str().to_owned();
    s.push(".part");
    PathBuf::from(s)
}

/// Decides the local file name for `source`. Without a suggestion from the
/// metadata API, the response head of a one-byte range GET is used.
pub fn pick_file_name(client: &HttpClient, source: &ResolvedSource) -> TransferResult<String> {
    if source.file_name.is_some() {
        return Ok(naming::choose_file_name(
            source.file_name.as_deref(),
            None,
            &source.url,
        ));
    }
    let head = client.probe(&source.url, &source.headers)?;
    tracing::debug!(
        status = head.status,
        size = ?head.content_range_total().or(head.content_length()),
        "probed response head"
    );
    // 416: empty resource, nothing to learn from the head.
    if !head.is_success() && head.status != 416 {
        return Err(TransferError::network(
            &source.url,
            NetworkFailure::Status(head.status),
        ));
    }
    Ok(naming::choose_file_name(
        None,
        head.content_disposition(),
        &source.url,
    ))
}

/// Streams `url` into `dest` and returns the byte count.
///
/// Fails with `NetworkError` on transport failure, non-2xx status or a body
/// shorter than `Content-Length`, and with `IOError` when the local write fails.
pub fn download(
    client: &HttpClient,
    url: &str,
    headers: &Headers,
    dest: &Path,
    progress: &mut dyn FnMut(&Progress),
) -> TransferResult<u64> {
    if url.is_empty() {
        return Err(TransferError::resolution(url, "empty download URL"));
    }
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TransferError::io(parent, e))?;
    }
    let part = part_path(dest);
    let started = Instant::now();
    let mut out: Option<BufWriter<File>> = None;
    let mut bytes = 0u64;

    let head = client.stream(url, headers, |head, chunk| {
        if !head.is_success() {
            return Err(TransferError::network(url, NetworkFailure::Status(head.status)));
        }
        if out.is_none() {
            let file = File::create(&part).map_err(|e| TransferError::io(&part, e))?;
            out = Some(BufWriter::new(file));
        }
        if let Some(writer) = out.as_mut() {
            writer
                .write_all(chunk)
                .map_err(|e| TransferError::io(&part, e))?;
        }
        bytes += chunk.len() as u64;
        progress(&Progress {
            bytes_done: bytes,
            total_bytes: head.content_length(),
            elapsed_secs: started.elapsed().as_secs_f64(),
        });
        Ok(Flow::Continue)
    })?;

    if !head.is_success() {
        return Err(TransferError::network(url, NetworkFailure::Status(head.status)));
    }
    // Backstop: libcurl already fails a short HTTP/1.1 body on its own.
    if let Some(expected) = head.content_length() {
        if expected != bytes {
            return Err(TransferError::network(
                url,
                NetworkFailure::PartialTransfer {
                    expected,
                    received: bytes,
                },
            ));
        }
    }

    let file = match out {
        Some(w) => w
            .into_inner()
            .map_err(|e| TransferError::io(&part, e.into_error()))?,
        None => File::create(&part).map_err(|e| TransferError::io(&part, e))?,
    };
    file.sync_all().map_err(|e| TransferError::io(&part, e))?;
    drop(file);
    fs::rename(&part, dest).map_err(|e| TransferError::io(dest, e))?;

    tracing::info!(bytes, path = %dest.display(), "download complete");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/tmp/x/model.ckpt")),
            PathBuf::from("/tmp/x/model.ckpt.part")
        );
    }

    #[test]
    fn progress_math() {
        let p = Progress {
            bytes_done: 50,
            total_bytes: Some(200),
            elapsed_secs: 2.0,
        };
        assert_eq!(p.bytes_per_sec(), 25.0);
        assert_eq!(p.eta_secs(), Some(6.0));
        assert_eq!(p.fraction(), Some(0.25));

        let unknown = Progress {
            bytes_done: 50,
            total_bytes: None,
            elapsed_secs: 0.0,
        };
        assert_eq!(unknown.bytes_per_sec(), 0.0);
        assert!(unknown.eta_secs().is_none());
        assert!(unknown.fraction().is_none());
    }
}
