//! Keep credentials out of logs and error messages.

/// Query parameters whose values are replaced before a URL is logged.
const SECRET_PARAMS: &[&str] = &["token", "key", "api_key", "apikey"];

/// Returns `url` with credential-bearing query values replaced by `***`.
/// Unparsable input is returned as-is.
pub fn redact_url(url: &str) -> String {
    let mut parsed = match url::Url::parse(url) {
        Ok(u) => u,
        Err(_) => return url.to_string(),
    };
    if parsed.query().is_none() {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let hidden = SECRET_PARAMS.iter().any(|s| k.eq_ignore_ascii_case(s));
            let v = if hidden { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}
