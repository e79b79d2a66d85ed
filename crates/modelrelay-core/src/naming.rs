//! Local file names for downloads and their sidecars, and paths inside the
//! target repository.

/// Used when neither the response nor the URL suggests anything usable.
pub const DEFAULT_FILE_NAME: &str = "downloaded_file";

/// Longest file name most filesystems accept, in bytes.
const NAME_MAX: usize = 255;

/// Picks the local name for a download.
///
/// Order: the resolver's suggestion (metadata API), the `Content-Disposition`
/// header, the last URL path segment, then [`DEFAULT_FILE_NAME`]. Whatever
/// wins is sanitized.
pub fn choose_file_name(
    suggested: Option<&str>,
    content_disposition: Option<&str>,
    url: &str,
) -> String {
    let candidates = [
        suggested.map(str::to_string),
        content_disposition.and_then(filename_from_content_disposition),
        filename_from_url(url),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(|c| sanitize_file_name(&c))
        .find(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}

/// Extracts the file name from a `Content-Disposition` value.
///
/// `filename*=UTF-8''...` (RFC 5987) wins over `filename=`; quoted values
/// have their quotes and backslash escapes removed.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').map(str::trim) {
        let Some((name, raw)) = param.split_once('=') else {
            continue;
        };
        let raw = raw.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = raw.split_once("''").map(|(_, rest)| rest).unwrap_or(raw);
                let decoded = percent_decode(unquote(encoded).as_str());
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
            "filename" => {
                let v = unquote(raw);
                if !v.is_empty() {
                    plain = Some(v);
                }
            }
            _ => {}
        }
    }
    plain
}

/// Last non-empty path segment of `url`, percent-decoded.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode(segment);
    if decoded == "." || decoded == ".." {
        return None;
    }
    Some(decoded)
}

/// Makes `name` safe as a single path component.
///
/// Separators, control characters and characters Windows rejects become
/// `_`; runs of `_` collapse; leading and trailing dots, spaces and
/// underscores are trimmed; the result is cut to [`NAME_MAX`] bytes on a
/// char boundary.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let bad = c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|');
        let c = if bad { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches(|c: char| c == '.' || c == '_' || c.is_whitespace());
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

/// Base name used for sidecars and the repository folder:
/// everything before the last `.`.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// `<stem>.<ext>`
pub fn sidecar_name(stem: &str, ext: &str) -> String {
    format!("{}.{}", stem, ext)
}

/// Path of `file_name` inside the target repository.
pub fn repo_path(stem: &str, file_name: &str, folder_per_model: bool) -> String {
    if folder_per_model {
        format!("{}/{}", stem, file_name)
    } else {
        file_name.to_string()
    }
}

fn unquote(v: &str) -> String {
    let inner = match v.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(s) => s,
        None => return v.to_string(),
    };
    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
        if escaped || c != '\\' {
            out.push(c);
            escaped = false;
        } else {
            escaped = true;
        }
    }
    out
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
