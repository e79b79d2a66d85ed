//! Pure address classification: no I/O, decided once per request.

use url::Url;

use crate::error::{TransferError, TransferResult};

/// Model (and optional version) named by a hosting-site page URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelPage {
    pub model_id: u64,
    pub version_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressKind {
    /// Points straight at the payload; carried exactly as given.
    DirectUrl(String),
    /// Needs a metadata lookup to find the payload.
    HostingPageUrl(ModelPage),
}

/// Classifies `address`.
///
/// - `https://<page host>/models/<id>[/slug][?modelVersionId=<v>]` is a page.
/// - `https://<page host>/api/download/models/<id>` is direct.
/// - Any http(s) URL whose last path segment has a file extension is direct.
///
/// Everything else is a `ResolutionError`.
pub fn classify(address: &str, page_hosts: &[String]) -> TransferResult<AddressKind> {
    let fail = |reason: &str| TransferError::resolution(address, reason);

    let url = Url::parse(address).map_err(|e| fail(&format!("not a URL ({})", e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(fail("only http and https addresses are supported"));
    }
    let host = url.host_str().ok_or_else(|| fail("URL has no host"))?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    let on_page_host = page_hosts.iter().any(|h| h.eq_ignore_ascii_case(host));
    if on_page_host {
        match segments.as_slice() {
            ["models", id, ..] => {
                let model_id = id
                    .parse::<u64>()
                    .map_err(|_| fail("model id is not a number"))?;
                let version_id = match url
                    .query_pairs()
                    .find(|(k, _)| k == "modelVersionId")
                {
                    Some((_, v)) => Some(
                        v.parse::<u64>()
                            .map_err(|_| fail("modelVersionId is not a number"))?,
                    ),
                    None => None,
                };
                return Ok(AddressKind::HostingPageUrl(ModelPage {
                    model_id,
                    version_id,
                }));
            }
            ["api", "download", "models", id] if id.parse::<u64>().is_ok() => {
                return Ok(AddressKind::DirectUrl(address.to_string()));
            }
            _ => {}
        }
    }

    if segments.last().is_some_and(|s| has_extension(s)) {
        return Ok(AddressKind::DirectUrl(address.to_string()));
    }

    Err(fail("neither a model page nor a direct file URL"))
}

fn has_extension(segment: &str) -> bool {
    matches!(segment.rsplit_once('.'), Some((stem, ext)) if !stem.is_empty() && !ext.is_empty())
}
