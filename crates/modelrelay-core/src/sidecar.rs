//! Files stored next to a model from a page lookup: metadata JSON, preview
//! image, page HTML. Each is best effort; failures are logged, not raised.

use std::fs;
use std::path::{Path, PathBuf};

use crate::download::{self, Progress};
use crate::error::{TransferError, TransferResult};
use crate::http::{Headers, HttpClient};
use crate::naming;
use crate::resolver::ModelInfo;

/// Writes the sidecars for `stem` into `dir` and returns the ones that exist
/// afterwards.
pub fn write_sidecars(
    client: &HttpClient,
    dir: &Path,
    stem: &str,
    info: &ModelInfo,
    page_headers: &Headers,
) -> Vec<PathBuf> {
    let mut present = Vec::new();

    let json_path = dir.join(naming::sidecar_name(stem, "json"));
    match write_metadata(&json_path, info) {
        Ok(()) => present.push(json_path),
        Err(e) => tracing::warn!("metadata sidecar failed: {}", e),
    }

    let image_path = dir.join(naming::sidecar_name(stem, "jpg"));
    if image_path.exists() {
        tracing::info!(path = %image_path.display(), "preview image exists, skipping");
        present.push(image_path);
    } else if let Some(image_url) = &info.preview_image_url {
        let mut quiet = |_: &Progress| {};
        match download::download(client, image_url, &Headers::new(), &image_path, &mut quiet) {
            Ok(_) => present.push(image_path),
            Err(e) => tracing::warn!("preview image failed: {}", e),
        }
    } else {
        tracing::info!("no preview image for this version");
    }

    let html_path = dir.join(naming::sidecar_name(stem, "html"));
    match fetch_page(client, &info.model_url, page_headers, &html_path) {
        Ok(()) => present.push(html_path),
        Err(e) => tracing::warn!("page snapshot failed: {}", e),
    }

    present
}

/// Pretty JSON of `info`; an existing file is kept as is.
pub fn write_metadata(path: &Path, info: &ModelInfo) -> TransferResult<()> {
    if path.exists() {
        tracing::info!(path = %path.display(), "metadata exists, skipping");
        return Ok(());
    }
    let json = serde_json::to_string_pretty(info)
        .map_err(|e| TransferError::io(path, std::io::Error::other(e)))?;
    fs::write(path, json).map_err(|e| TransferError::io(path, e))
}

/// Saves the model page as served to an authenticated client. Always refreshed.
fn fetch_page(client: &HttpClient, url: &str, headers: &Headers, path: &Path) -> TransferResult<()> {
    let response = client.get(url, headers)?.ensure_success(url)?;
    fs::write(path, response.body).map_err(|e| TransferError::io(path, e))
}
