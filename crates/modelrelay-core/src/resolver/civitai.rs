//! Civitai `GET /models/{id}` response and asset selection.

use serde::{Deserialize, Serialize};

use super::classify::ModelPage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiModel {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub tags: Vec<ApiTag>,
    #[serde(default)]
    pub model_versions: Vec<ApiVersion>,
}

/// Tags come back either as bare strings or as `{ "name": ... }` objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiTag {
    Name(String),
    Object { name: String },
}

impl ApiTag {
    fn into_name(self) -> String {
        match self {
            ApiTag::Name(n) | ApiTag::Object { name: n } => n,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiVersion {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub files: Vec<ApiFile>,
    #[serde(default)]
    pub images: Vec<ApiImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub primary: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiImage {
    pub url: String,
}

/// Metadata kept for the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: u64,
    pub model_name: String,
    pub model_description: String,
    pub model_url: String,
    pub model_type: Option<String>,
    pub model_tags: Vec<String>,
    pub model_version_id: u64,
    pub model_version_name: Option<String>,
    pub download_url: String,
    pub file_name: Option<String>,
    pub preview_image_url: Option<String>,
}

/// Why no asset could be selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectError {
    NoVersions,
    VersionNotFound(u64),
    NoFiles(u64),
}

impl std::fmt::Display for SelectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectError::NoVersions => write!(f, "model has no versions"),
            SelectError::VersionNotFound(v) => write!(f, "model version {} not found", v),
            SelectError::NoFiles(v) => write!(f, "version {} has no downloadable file", v),
        }
    }
}

/// Picks the version named by the page (or the first one) and its primary
/// file (or the first file that has a download URL).
pub(crate) fn select(model: ApiModel, page: &ModelPage, page_url: String) -> Result<ModelInfo, SelectError> {
    let ApiModel {
        id,
        name,
        description,
        kind,
        tags,
        model_versions,
    } = model;

    let version = match page.version_id {
        Some(wanted) => model_versions
            .into_iter()
            .find(|v| v.id == wanted)
            .ok_or(SelectError::VersionNotFound(wanted))?,
        None => model_versions
            .into_iter()
            .next()
            .ok_or(SelectError::NoVersions)?,
    };

    let has_url = |f: &ApiFile| f.download_url.as_deref().is_some_and(|u| !u.is_empty());
    let file = version
        .files
        .iter()
        .find(|&f| f.primary == Some(true) && has_url(f))
        .or_else(|| version.files.iter().find(|&f| has_url(f)))
        .ok_or(SelectError::NoFiles(version.id))?;

    Ok(ModelInfo {
        model_id: id,
        model_name: name,
        model_description: description.unwrap_or_default(),
        model_url: page_url,
        model_type: kind,
        model_tags: tags.into_iter().map(ApiTag::into_name).collect(),
        model_version_id: version.id,
        model_version_name: version.name.clone(),
        download_url: file.download_url.clone().unwrap_or_default(),
        file_name: file.name.clone(),
        preview_image_url: version.images.first().map(|i| i.url.clone()),
    })
}
