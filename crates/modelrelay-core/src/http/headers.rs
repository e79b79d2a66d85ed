//! Response status line and header collection.

/// Status and headers of the final response (after redirects).
#[derive(Debug, Clone, Default)]
pub struct ResponseHead {
    pub status: u32,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Feeds one raw header line as delivered by libcurl. A status line
    /// starts a new response (redirect hop or `100 Continue`), so earlier
    /// headers are dropped.
    pub(crate) fn push_line(&mut self, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if line.starts_with("HTTP/") {
            self.status = parse_status_line(line).unwrap_or(0);
            self.headers.clear();
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            self.headers
                .push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    /// First header value with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")?.parse().ok()
    }

    pub fn content_disposition(&self) -> Option<&str> {
        self.header("content-disposition")
    }

    /// Total size from `Content-Range: bytes 0-0/12345`, as sent for range probes.
    pub fn content_range_total(&self) -> Option<u64> {
        let value = self.header("content-range")?;
        let (_, total) = value.rsplit_once('/')?;
        total.trim().parse().ok()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}
