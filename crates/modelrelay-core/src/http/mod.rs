//! Blocking HTTP client over libcurl easy handles.
//!
//! One `HttpClient` is built per invocation from [`HttpConfig`] and passed to
//! every stage; each request gets a fresh easy handle. Status codes are not
//! interpreted here beyond what the caller's sink decides, so stages can map
//! them to their own error kinds.

mod headers;

pub use headers::ResponseHead;

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Read;

use curl::easy::{Easy, List, ReadError};
use serde::de::DeserializeOwned;

use crate::config::HttpConfig;
use crate::error::{NetworkFailure, TransferError, TransferResult};
use crate::redact::redact_url;

/// What the body sink wants after a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop the transfer cleanly; the body is not needed any more.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Put,
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct Response {
    pub head: ResponseHead,
    pub body: Vec<u8>,
}

impl Response {
    pub fn status(&self) -> u32 {
        self.head.status
    }

    /// Turns a non-2xx status into `NetworkError`.
    pub fn ensure_success(self, url: &str) -> TransferResult<Self> {
        if self.head.is_success() {
            Ok(self)
        } else {
            Err(TransferError::network(
                url,
                NetworkFailure::Status(self.head.status),
            ))
        }
    }

    pub fn json<T: DeserializeOwned>(&self, url: &str) -> TransferResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            TransferError::network(url, NetworkFailure::UnexpectedBody(e.to_string()))
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Request headers, name to value.
pub type Headers = HashMap<String, String>;

pub struct HttpClient {
    cfg: HttpConfig,
}

impl HttpClient {
    pub fn new(cfg: HttpConfig) -> Self {
        Self { cfg }
    }

    /// GET and buffer the whole body.
    pub fn get(&self, url: &str, headers: &Headers) -> TransferResult<Response> {
        self.buffered(Method::Get, url, headers, None)
    }

    /// POST `body` and buffer the response.
    pub fn post(&self, url: &str, headers: &Headers, body: &[u8]) -> TransferResult<Response> {
        let mut reader = body;
        self.buffered(
            Method::Post,
            url,
            headers,
            Some((&mut reader, body.len() as u64)),
        )
    }

    /// PUT exactly `len` bytes read from `body` and buffer the response.
    pub fn put(
        &self,
        url: &str,
        headers: &Headers,
        body: &mut dyn Read,
        len: u64,
    ) -> TransferResult<Response> {
        self.buffered(Method::Put, url, headers, Some((body, len)))
    }

    /// GET `url`, handing each body chunk to `on_data` together with the
    /// final response head. The sink sees the status before the first byte
    /// and may reject it by returning an error.
    pub fn stream<F>(&self, url: &str, headers: &Headers, on_data: F) -> TransferResult<ResponseHead>
    where
        F: FnMut(&ResponseHead, &[u8]) -> TransferResult<Flow>,
    {
        self.perform(Method::Get, url, headers, None, on_data)
    }

    /// Fetches only the response head of a GET by asking for the first byte
    /// (`Range: bytes=0-0`) and stopping at the first body chunk. Used where
    /// HEAD is not honored by the host.
    pub fn probe(&self, url: &str, headers: &Headers) -> TransferResult<ResponseHead> {
        let mut headers = headers.clone();
        headers.insert("Range".to_string(), "bytes=0-0".to_string());
        self.perform(Method::Get, url, &headers, None, |_, _| Ok(Flow::Stop))
    }

    fn buffered(
        &self,
        method: Method,
        url: &str,
        headers: &Headers,
        body: Option<(&mut dyn Read, u64)>,
    ) -> TransferResult<Response> {
        let mut buf = Vec::new();
        let head = self.perform(method, url, headers, body, |_, data| {
            buf.extend_from_slice(data);
            Ok(Flow::Continue)
        })?;
        Ok(Response { head, body: buf })
    }

    fn easy(&self, url: &str) -> TransferResult<Easy> {
        let net = |e| TransferError::network(url, NetworkFailure::Curl(e));
        let mut easy = Easy::new();
        easy.url(url).map_err(net)?;
        easy.follow_location(true).map_err(net)?;
        easy.max_redirections(self.cfg.max_redirects).map_err(net)?;
        easy.connect_timeout(self.cfg.connect_timeout()).map_err(net)?;
        easy.low_speed_limit(self.cfg.low_speed_limit_bytes)
            .map_err(net)?;
        easy.low_speed_time(self.cfg.low_speed_time()).map_err(net)?;
        easy.useragent(&self.cfg.user_agent).map_err(net)?;
        Ok(easy)
    }

    fn perform<F>(
        &self,
        method: Method,
        url: &str,
        headers: &Headers,
        body: Option<(&mut dyn Read, u64)>,
        mut on_data: F,
    ) -> TransferResult<ResponseHead>
    where
        F: FnMut(&ResponseHead, &[u8]) -> TransferResult<Flow>,
    {
        let net = |e| TransferError::network(url, NetworkFailure::Curl(e));
        let mut easy = self.easy(url)?;
        tracing::debug!(method = ?method, url = %redact_url(url), "http request");

        let mut list = List::new();
        for (k, v) in headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))
                .map_err(net)?;
        }
        if method != Method::Get {
            // No `Expect: 100-continue` round trip before the body.
            list.append("Expect:").map_err(net)?;
        }
        easy.http_headers(list).map_err(net)?;

        let mut reader = None;
        match (method, body) {
            (Method::Post, Some((r, len))) => {
                easy.post(true).map_err(net)?;
                easy.post_field_size(len).map_err(net)?;
                reader = Some(r);
            }
            (Method::Put, Some((r, len))) => {
                easy.upload(true).map_err(net)?;
                easy.in_filesize(len).map_err(net)?;
                reader = Some(r);
            }
            (Method::Post, None) => {
                easy.post(true).map_err(net)?;
                easy.post_field_size(0).map_err(net)?;
            }
            _ => {}
        }

        let head = RefCell::new(ResponseHead::default());
        let sink_error: RefCell<Option<TransferError>> = RefCell::new(None);
        let mut stopped = false;

        let result = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|line| {
                    head.borrow_mut().push_line(line);
                    true
                })
                .map_err(net)?;
            transfer
                .write_function(|data| {
                    let current = head.borrow();
                    match on_data(&current, data) {
                        Ok(Flow::Continue) => Ok(data.len()),
                        Ok(Flow::Stop) => {
                            stopped = true;
                            Ok(0)
                        }
                        Err(e) => {
                            *sink_error.borrow_mut() = Some(e);
                            Ok(0)
                        }
                    }
                })
                .map_err(net)?;
            if let Some(r) = reader {
                transfer
                    .read_function(move |buf| r.read(buf).map_err(|_| ReadError::Abort))
                    .map_err(net)?;
            }
            transfer.perform()
        };

        if let Some(e) = sink_error.into_inner() {
            return Err(e);
        }
        match result {
            Err(e) if stopped && e.is_write_error() => {}
            Err(e) => return Err(net(e)),
            Ok(()) => {}
        }

        let mut head = head.into_inner();
        if head.status == 0 {
            head.status = easy.response_code().map_err(net)?;
        }
        tracing::debug!(status = head.status, url = %redact_url(url), "http response");
        Ok(head)
    }
}
