//! Uploader: relays local files into a Hub repository as one commit.
//!
//! Flow per call: preupload (the Hub decides LFS vs regular per file), LFS
//! objects pushed through the git-lfs batch API, then a single NDJSON commit
//! referencing every file. No step is retried.

mod lfs;
mod wire;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::checksum::{self, FileDigest};
use crate::error::{NetworkFailure, TransferError, TransferResult};
use crate::http::{Headers, HttpClient, Response};

use wire::{CommitLine, CommitResponse, PreuploadFile, PreuploadRequest, PreuploadResponse, UploadMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    #[default]
    Model,
    Dataset,
    Space,
}

impl RepoType {
    /// Segment used under `/api/`.
    fn api_segment(self) -> &'static str {
        match self {
            RepoType::Model => "models",
            RepoType::Dataset => "datasets",
            RepoType::Space => "spaces",
        }
    }

    /// Leading path segment of web and git URLs; models have none.
    fn url_prefix(self) -> Option<&'static str> {
        match self {
            RepoType::Model => None,
            RepoType::Dataset => Some("datasets"),
            RepoType::Space => Some("spaces"),
        }
    }
}

impl FromStr for RepoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "model" => Ok(RepoType::Model),
            "dataset" => Ok(RepoType::Dataset),
            "space" => Ok(RepoType::Space),
            other => Err(format!(
                "unknown repository type '{}' (expected model, dataset or space)",
                other
            )),
        }
    }
}

/// Repository on the target service, `owner/name` at a revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub owner: String,
    pub name: String,
    pub repo_type: RepoType,
    pub revision: String,
}

impl RepoTarget {
    pub fn new(repo_id: &str, repo_type: RepoType, revision: &str) -> TransferResult<Self> {
        let invalid = || TransferError::resolution(repo_id, "repository id must look like owner/name");
        let (owner, name) = repo_id.split_once('/').ok_or_else(invalid)?;
        let ok = |s: &str| !s.is_empty() && !s.contains('/') && !s.chars().any(char::is_whitespace);
        if !ok(owner) || !ok(name) {
            return Err(invalid());
        }
        if revision.is_empty() {
            return Err(TransferError::resolution(repo_id, "revision must not be empty"));
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            repo_type,
            revision: revision.to_string(),
        })
    }

    pub fn repo_id(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Repository plus the token that may write to it.
#[derive(Clone)]
pub struct UploadTarget {
    pub repo: RepoTarget,
    pub token: String,
}

impl fmt::Debug for UploadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadTarget")
            .field("repo", &self.repo)
            .field("token", &"***")
            .finish()
    }
}

/// A local file and where it should land in the repository.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub local_path: PathBuf,
    pub path_in_repo: String,
}

/// A file that is now in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub path_in_repo: String,
    /// Web location of the file.
    pub location: String,
}

#[derive(Debug, Clone, Default)]
pub struct CommitOutcome {
    pub commit_url: Option<String>,
    pub commit_oid: Option<String>,
    pub objects: Vec<UploadedObject>,
}

enum Prepared {
    Lfs {
        path_in_repo: String,
        digest: FileDigest,
    },
    Regular {
        path_in_repo: String,
        content: String,
    },
}

pub struct Uploader<'a> {
    client: &'a HttpClient,
    endpoint: &'a str,
    target: &'a UploadTarget,
}

impl<'a> Uploader<'a> {
    pub fn new(client: &'a HttpClient, endpoint: &'a str, target: &'a UploadTarget) -> Self {
        Self {
            client,
            endpoint,
            target,
        }
    }

    /// Uploads `files` in one commit and returns their remote locations.
    ///
    /// `AuthError` when the Hub rejects the token, `NetworkError` for any
    /// other remote failure, `IOError` when a local file cannot be read.
    pub fn upload(&self, files: &[UploadFile], summary: &str) -> TransferResult<CommitOutcome> {
        if files.is_empty() {
            return Ok(CommitOutcome::default());
        }
        tracing::info!(
            repo = %self.target.repo.repo_id(),
            files = files.len(),
            "upload starting"
        );

        let modes = self.preupload(files)?;
        let mut prepared = Vec::with_capacity(files.len());
        for file in files {
            let Some(result) = modes.iter().find(|m| m.path == file.path_in_repo) else {
                return Err(TransferError::network(
                    self.endpoint,
                    NetworkFailure::UnexpectedBody(format!(
                        "preupload did not mention {}",
                        file.path_in_repo
                    )),
                ));
            };
            if result.should_ignore {
                tracing::warn!(path = %file.path_in_repo, "ignored by repository rules, skipping");
                continue;
            }
            match result.upload_mode {
                UploadMode::Lfs => {
                    let digest = checksum::digest_path(&file.local_path)?;
                    self.push_lfs_object(&file.local_path, &digest)?;
                    prepared.push(Prepared::Lfs {
                        path_in_repo: file.path_in_repo.clone(),
                        digest,
                    });
                }
                UploadMode::Regular => {
                    let bytes = std::fs::read(&file.local_path)
                        .map_err(|e| TransferError::io(&file.local_path, e))?;
                    prepared.push(Prepared::Regular {
                        path_in_repo: file.path_in_repo.clone(),
                        content: BASE64.encode(bytes),
                    });
                }
            }
        }
        if prepared.is_empty() {
            return Ok(CommitOutcome::default());
        }

        let commit = self.commit(&prepared, summary)?;
        let objects = prepared
            .iter()
            .map(|p| {
                let path = match p {
                    Prepared::Lfs { path_in_repo, .. } | Prepared::Regular { path_in_repo, .. } => {
                        path_in_repo
                    }
                };
                Ok(UploadedObject {
                    path_in_repo: path.clone(),
                    location: self.blob_url(path)?,
                })
            })
            .collect::<TransferResult<Vec<_>>>()?;
        tracing::info!(commit = commit.commit_oid.as_deref().unwrap_or("-"), "upload committed");
        Ok(CommitOutcome {
            commit_url: commit.commit_url,
            commit_oid: commit.commit_oid,
            objects,
        })
    }

    fn preupload(&self, files: &[UploadFile]) -> TransferResult<Vec<wire::PreuploadResult>> {
        let url = self.api_url("preupload")?;
        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let sample = checksum::read_sample(&file.local_path)?;
            let size = std::fs::metadata(&file.local_path)
                .map_err(|e| TransferError::io(&file.local_path, e))?
                .len();
            entries.push(PreuploadFile {
                path: &file.path_in_repo,
                sample: BASE64.encode(sample),
                size,
            });
        }
        let body = serde_json::to_vec(&PreuploadRequest { files: entries })
            .map_err(|e| TransferError::network(&url, NetworkFailure::UnexpectedBody(e.to_string())))?;
        let response = self.client.post(&url, &self.json_headers(), &body)?;
        let response = self.check(response, &url)?;
        let parsed: PreuploadResponse = response.json(&url)?;
        Ok(parsed.files)
    }

    fn commit(&self, prepared: &[Prepared], summary: &str) -> TransferResult<CommitResponse> {
        let url = self.api_url("commit")?;
        let mut lines = vec![CommitLine::Header {
            summary,
            description: "",
        }];
        for p in prepared {
            lines.push(match p {
                Prepared::Lfs {
                    path_in_repo,
                    digest,
                } => CommitLine::LfsFile {
                    path: path_in_repo,
                    algo: "sha256",
                    oid: &digest.sha256,
                    size: digest.size,
                },
                Prepared::Regular {
                    path_in_repo,
                    content,
                } => CommitLine::File {
                    content: content.clone(),
                    path: path_in_repo,
                    encoding: "base64",
                },
            });
        }
        let body = wire::ndjson(&lines)
            .map_err(|e| TransferError::network(&url, NetworkFailure::UnexpectedBody(e.to_string())))?;
        let mut headers = self.auth_headers();
        headers.insert("Content-Type".to_string(), "application/x-ndjson".to_string());
        let response = self.client.post(&url, &headers, &body)?;
        let response = self.check(response, &url)?;
        if response.body.is_empty() {
            return Ok(CommitResponse::default());
        }
        response.json(&url)
    }

    fn auth_headers(&self) -> Headers {
        let mut h = Headers::new();
        h.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.target.token),
        );
        h
    }

    fn json_headers(&self) -> Headers {
        let mut h = self.auth_headers();
        h.insert("Content-Type".to_string(), "application/json".to_string());
        h
    }

    /// 401/403 from the Hub means the token was refused.
    fn check(&self, response: Response, url: &str) -> TransferResult<Response> {
        match response.status() {
            401 | 403 => {
                tracing::warn!(status = response.status(), body = %response.text(), "hub refused the token");
                Err(TransferError::Auth {
                    url: url.to_string(),
                    status: response.status(),
                })
            }
            _ => response.ensure_success(url),
        }
    }

    fn endpoint_url(&self, segments: &[&str]) -> TransferResult<String> {
        let mut url = url::Url::parse(self.endpoint)
            .map_err(|e| TransferError::resolution(self.endpoint, format!("bad endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| TransferError::resolution(self.endpoint, "endpoint cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    /// `/api/{type}s/{owner}/{name}/{action}/{revision}`
    fn api_url(&self, action: &str) -> TransferResult<String> {
        let repo = &self.target.repo;
        self.endpoint_url(&[
            "api",
            repo.repo_type.api_segment(),
            &repo.owner,
            &repo.name,
            action,
            &repo.revision,
        ])
    }

    /// `/{prefix}/{owner}/{name}.git/info/lfs/objects/batch`
    fn lfs_batch_url(&self) -> TransferResult<String> {
        let repo = &self.target.repo;
        let git_name = format!("{}.git", repo.name);
        let mut segments: Vec<&str> = repo.repo_type.url_prefix().into_iter().collect();
        segments.extend([
            repo.owner.as_str(),
            git_name.as_str(),
            "info",
            "lfs",
            "objects",
            "batch",
        ]);
        self.endpoint_url(&segments)
    }

    /// `/{prefix}/{owner}/{name}/blob/{revision}/{path}`
    pub fn blob_url(&self, path_in_repo: &str) -> TransferResult<String> {
        let repo = &self.target.repo;
        let mut segments: Vec<&str> = repo.repo_type.url_prefix().into_iter().collect();
        segments.extend([
            repo.owner.as_str(),
            repo.name.as_str(),
            "blob",
            repo.revision.as_str(),
        ]);
        segments.extend(path_in_repo.split('/').filter(|s| !s.is_empty()));
        self.endpoint_url(&segments)
    }
}
