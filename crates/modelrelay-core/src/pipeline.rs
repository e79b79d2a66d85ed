//! Resolve → download → (optional) upload, run once per invocation.

use std::fs;
use std::path::PathBuf;

use crate::config::RelayConfig;
use crate::download::{self, Progress};
use crate::error::{TransferError, TransferResult};
use crate::http::HttpClient;
use crate::naming;
use crate::redact::redact_url;
use crate::resolver::Resolver;
use crate::sidecar;
use crate::upload::{CommitOutcome, UploadFile, UploadTarget, Uploader};

/// One transfer, built from the command line and consumed by [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Page or file address as typed by the user.
    pub source: String,
    pub destination_dir: PathBuf,
    /// Source-site key; falls back to the configured one.
    pub source_api_key: Option<String>,
    /// Write metadata/preview/page files next to the model.
    pub with_sidecars: bool,
    pub upload: Option<UploadTarget>,
}

#[derive(Debug, Clone)]
pub struct TransferReport {
    pub resolved_url: String,
    pub local_path: PathBuf,
    pub bytes: u64,
    /// The destination already existed and was not downloaded again.
    pub skipped_existing: bool,
    pub sidecars: Vec<PathBuf>,
    pub upload: Option<CommitOutcome>,
}

pub struct Pipeline<'a> {
    client: &'a HttpClient,
    cfg: &'a RelayConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(client: &'a HttpClient, cfg: &'a RelayConfig) -> Self {
        Self { client, cfg }
    }

    pub fn run(
        &self,
        request: &TransferRequest,
        progress: &mut dyn FnMut(&Progress),
    ) -> TransferResult<TransferReport> {
        let api_key = request
            .source_api_key
            .as_deref()
            .or(self.cfg.source.api_key.as_deref());
        let resolver = Resolver::new(self.client, &self.cfg.source, api_key);

        let source = resolver.resolve(&request.source)?;
        tracing::info!(url = %redact_url(&source.url), "resolved download URL");

        let file_name = download::pick_file_name(self.client, &source)?;
        let local_path = request.destination_dir.join(&file_name);

        let skipped_existing = self.cfg.skip_existing && local_path.exists();
        let bytes = if skipped_existing {
            tracing::info!(path = %local_path.display(), "model exists, skipping download");
            fs::metadata(&local_path)
                .map_err(|e| TransferError::io(&local_path, e))?
                .len()
        } else {
            download::download(
                self.client,
                &source.url,
                &source.headers,
                &local_path,
                progress,
            )?
        };

        let stem = naming::file_stem(&file_name).to_string();
        let sidecars = match &source.model {
            Some(info) if request.with_sidecars => sidecar::write_sidecars(
                self.client,
                &request.destination_dir,
                &stem,
                info,
                &resolver.credentials_for(&info.model_url),
            ),
            _ => Vec::new(),
        };

        let upload = match &request.upload {
            Some(target) => {
                let mut files = vec![UploadFile {
                    local_path: local_path.clone(),
                    path_in_repo: naming::repo_path(
                        &stem,
                        &file_name,
                        self.cfg.target.folder_per_model,
                    ),
                }];
                for path in &sidecars {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    files.push(UploadFile {
                        local_path: path.clone(),
                        path_in_repo: naming::repo_path(
                            &stem,
                            &name,
                            self.cfg.target.folder_per_model,
                        ),
                    });
                }
                let uploader = Uploader::new(self.client, &self.cfg.target.endpoint, target);
                Some(uploader.upload(&files, &format!("Upload {}", file_name))?)
            }
            None => None,
        };

        Ok(TransferReport {
            resolved_url: source.url,
            local_path,
            bytes,
            skipped_existing,
            sidecars,
            upload,
        })
    }
}
