//! Address Resolver: turns a user-supplied address into a concrete download URL.
//!
//! Direct file URLs pass through untouched. Model page URLs are looked up
//! through the source site's metadata API. The downloader only sees the
//! resulting [`ResolvedSource`].

mod civitai;
mod classify;

pub use civitai::ModelInfo;
pub use classify::{classify, AddressKind, ModelPage};

use crate::config::SourceConfig;
use crate::error::{TransferError, TransferResult};
use crate::http::{Headers, HttpClient};

/// Everything the downloader needs for one payload.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    /// Non-empty download URL.
    pub url: String,
    /// File name suggested by the metadata API, if any.
    pub file_name: Option<String>,
    /// Headers to send with the GET (source-site credential).
    pub headers: Headers,
    /// Present when the address was a model page.
    pub model: Option<ModelInfo>,
}

pub struct Resolver<'a> {
    client: &'a HttpClient,
    source: &'a SourceConfig,
    api_key: Option<&'a str>,
}

impl<'a> Resolver<'a> {
    pub fn new(client: &'a HttpClient, source: &'a SourceConfig, api_key: Option<&'a str>) -> Self {
        Self {
            client,
            source,
            api_key,
        }
    }

    pub fn resolve(&self, address: &str) -> TransferResult<ResolvedSource> {
        let resolved = match classify(address, &self.source.page_hosts)? {
            AddressKind::DirectUrl(url) => {
                tracing::debug!("direct file URL, no lookup needed");
                ResolvedSource {
                    headers: self.credentials_for(&url),
                    url,
                    file_name: None,
                    model: None,
                }
            }
            AddressKind::HostingPageUrl(page) => self.lookup(address, &page)?,
        };
        if resolved.url.is_empty() {
            return Err(TransferError::resolution(address, "resolved download URL is empty"));
        }
        Ok(resolved)
    }

    /// Bearer credential for URLs on the source site; nothing for other hosts.
    pub fn credentials_for(&self, url: &str) -> Headers {
        let mut headers = Headers::new();
        let Some(key) = self.api_key.filter(|k| !k.is_empty()) else {
            return headers;
        };
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase));
        let api_host = url::Url::parse(&self.source.api_base)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase));
        let trusted = host.is_some_and(|h| {
            api_host.as_deref() == Some(h.as_str())
                || self.source.page_hosts.iter().any(|p| p.eq_ignore_ascii_case(&h))
        });
        if trusted {
            headers.insert("Authorization".to_string(), format!("Bearer {}", key));
        }
        headers
    }

    fn lookup(&self, address: &str, page: &ModelPage) -> TransferResult<ResolvedSource> {
        let api_url = format!(
            "{}/models/{}",
            self.source.api_base.trim_end_matches('/'),
            page.model_id
        );
        tracing::info!(model_id = page.model_id, version_id = ?page.version_id, "metadata lookup");

        let response = self.client.get(&api_url, &self.credentials_for(&api_url))?;
        if response.status() == 404 {
            return Err(TransferError::resolution(
                address,
                format!("model {} not found", page.model_id),
            ));
        }
        let response = response.ensure_success(&api_url)?;
        let model: civitai::ApiModel = serde_json::from_slice(&response.body).map_err(|e| {
            TransferError::resolution(address, format!("unreadable metadata response: {}", e))
        })?;

        let info = civitai::select(model, page, page_url(address, page))
            .map_err(|e| TransferError::resolution(address, e.to_string()))?;
        tracing::info!(
            version_id = info.model_version_id,
            file = info.file_name.as_deref().unwrap_or("-"),
            "selected asset"
        );

        Ok(ResolvedSource {
            headers: self.credentials_for(&info.download_url),
            url: info.download_url.clone(),
            file_name: info.file_name.clone(),
            model: Some(info),
        })
    }
}

/// Canonical page URL on the same origin as `address`.
fn page_url(address: &str, page: &ModelPage) -> String {
    let origin = url::Url::parse(address)
        .map(|u| u.origin().ascii_serialization())
        .unwrap_or_default();
    match page.version_id {
        Some(v) => format!("{}/models/{}?modelVersionId={}", origin, page.model_id, v),
        None => format!("{}/models/{}", origin, page.model_id),
    }
}
