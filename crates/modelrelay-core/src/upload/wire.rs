//! JSON bodies of the Hub upload protocol: preupload, git-lfs batch, commit.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub(crate) struct PreuploadRequest<'a> {
    pub files: Vec<PreuploadFile<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PreuploadFile<'a> {
    pub path: &'a str,
    /// Base64 of the file head.
    pub sample: String,
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreuploadResponse {
    pub files: Vec<PreuploadResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PreuploadResult {
    pub path: String,
    pub upload_mode: UploadMode,
    #[serde(default)]
    pub should_ignore: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum UploadMode {
    Lfs,
    Regular,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchRequest<'a> {
    pub operation: &'static str,
    pub transfers: [&'static str; 2],
    pub objects: Vec<BatchObject<'a>>,
    pub hash_algo: &'static str,
    #[serde(rename = "ref")]
    pub git_ref: GitRef<'a>,
}

impl<'a> BatchRequest<'a> {
    pub fn upload(oid: &'a str, size: u64, revision: &'a str) -> Self {
        Self {
            operation: "upload",
            transfers: ["basic", "multipart"],
            objects: vec![BatchObject { oid, size }],
            hash_algo: "sha256",
            git_ref: GitRef { name: revision },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchObject<'a> {
    pub oid: &'a str,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct GitRef<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchResponse {
    #[serde(default)]
    pub transfer: Option<String>,
    pub objects: Vec<BatchResponseObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchResponseObject {
    pub oid: String,
    #[serde(default)]
    pub actions: Option<BatchActions>,
    #[serde(default)]
    pub error: Option<BatchObjectError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchActions {
    #[serde(default)]
    pub upload: Option<BatchAction>,
    #[serde(default)]
    pub verify: Option<BatchAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BatchAction {
    pub href: String,
    #[serde(default)]
    pub header: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchObjectError {
    pub code: u32,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyRequest<'a> {
    pub oid: &'a str,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletionRequest<'a> {
    pub oid: &'a str,
    pub parts: Vec<CompletedPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

/// One NDJSON line of a commit request.
#[derive(Debug, Serialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub(crate) enum CommitLine<'a> {
    Header {
        summary: &'a str,
        description: &'a str,
    },
    File {
        content: String,
        path: &'a str,
        encoding: &'static str,
    },
    LfsFile {
        path: &'a str,
        algo: &'static str,
        oid: &'a str,
        size: u64,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommitResponse {
    #[serde(default)]
    pub commit_url: Option<String>,
    #[serde(default)]
    pub commit_oid: Option<String>,
}

/// Serializes commit lines as newline-delimited JSON.
pub(crate) fn ndjson(lines: &[CommitLine<'_>]) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    for line in lines {
        serde_json::to_writer(&mut out, line)?;
        out.push(b'\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn commit_lines_are_tagged() {
        let body = ndjson(&[
            CommitLine::Header {
                summary: "Upload model",
                description: "",
            },
            CommitLine::LfsFile {
                path: "m/m.safetensors",
                algo: "sha256",
                oid: "abc",
                size: 3,
            },
            CommitLine::File {
                content: "aGk=".to_string(),
                path: "m/m.json",
                encoding: "base64",
            },
        ])
        .unwrap();
        let lines: Vec<Value> = String::from_utf8(body)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(
            lines[0],
            json!({"key": "header", "value": {"summary": "Upload model", "description": ""}})
        );
        assert_eq!(
            lines[1],
            json!({"key": "lfsFile", "value": {"path": "m/m.safetensors", "algo": "sha256", "oid": "abc", "size": 3}})
        );
        assert_eq!(lines[2]["key"], "file");
        assert_eq!(lines[2]["value"]["encoding"], "base64");
    }

    #[test]
    fn batch_request_shape() {
        let v = serde_json::to_value(BatchRequest::upload("deadbeef", 10, "main")).unwrap();
        assert_eq!(
            v,
            json!({
                "operation": "upload",
                "transfers": ["basic", "multipart"],
                "objects": [{"oid": "deadbeef", "size": 10}],
                "hash_algo": "sha256",
                "ref": {"name": "main"}
            })
        );
    }

    #[test]
    fn preupload_response_modes() {
        let r: PreuploadResponse = serde_json::from_str(
            r#"{"files":[{"path":"a.bin","uploadMode":"lfs"},{"path":"a.json","uploadMode":"regular","shouldIgnore":true}]}"#,
        )
        .unwrap();
        assert_eq!(r.files[0].upload_mode, UploadMode::Lfs);
        assert!(!r.files[0].should_ignore);
        assert_eq!(r.files[1].upload_mode, UploadMode::Regular);
        assert!(r.files[1].should_ignore);
    }

    #[test]
    fn batch_response_without_actions() {
        let r: BatchResponse =
            serde_json::from_str(r#"{"transfer":"basic","objects":[{"oid":"x","size":1}]}"#).unwrap();
        assert!(r.objects[0].actions.is_none());
        assert!(r.objects[0].error.is_none());
    }
}
