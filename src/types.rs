use bytes::Bytes;
use reqwest::Method;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Mime override that makes text responses carry one char per byte.
pub const RAW_TEXT_MIME: &str = "text/plain; charset=x-user-defined";

/// Byte range within a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    /// Number of bytes; `None` reads to the end of the resource
    pub size: Option<u64>,
}

impl ByteRange {
    pub fn new(start: u64, size: Option<u64>) -> Self {
        Self { start, size }
    }

    /// Inclusive end offset, if the range is bounded. A zero size is
    /// treated as open-ended.
    pub fn end(&self) -> Option<u64> {
        self.size
            .filter(|&s| s > 0)
            .map(|s| self.start.saturating_add(s - 1))
    }

    pub fn header_value(&self) -> String {
        match self.end() {
            Some(end) => format!("bytes={}-{}", self.start, end),
            None => format!("bytes={}-", self.start),
        }
    }
}

/// How the response body is handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    Bytes,
}

/// Per-call options. Every field defaults to "not set".
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit method; otherwise POST when `send_data` is set, else GET
    pub method: Option<Method>,
    pub send_data: Option<Bytes>,
    pub range: Option<ByteRange>,
    pub response_type: Option<ResponseFormat>,
    pub content_type: Option<String>,
    /// Overrides how a text response is interpreted; not sent on the wire
    pub mime_type: Option<String>,
    pub headers: HashMap<String, String>,
    /// Send cookies along. Fails against servers answering with a
    /// wildcard `Access-Control-Allow-Origin`.
    pub with_credentials: bool,
    /// Force BGZF decoding regardless of the resource name
    pub bgz: bool,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl LoadOptions {
    pub fn with_range(mut self, start: u64, size: Option<u64>) -> Self {
        self.range = Some(ByteRange::new(start, size));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.send_data = Some(body.into());
        self
    }

    pub fn with_bgz(mut self, bgz: bool) -> Self {
        self.bgz = bgz;
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn resolved_method(&self) -> Method {
        match (&self.method, &self.send_data) {
            (Some(method), _) => method.clone(),
            (None, Some(_)) => Method::POST,
            (None, None) => Method::GET,
        }
    }
}

/// A single logical load. Immutable apart from `cross_origin_retried`.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub url: String,
    pub method: Method,
    pub body: Option<Bytes>,
    pub range: Option<ByteRange>,
    pub content_type: Option<String>,
    pub mime_type: Option<String>,
    pub headers: HashMap<String, String>,
    pub response_format: ResponseFormat,
    pub with_credentials: bool,
    pub timeout: Option<Duration>,
    pub cross_origin_retried: bool,
}

impl LoadRequest {
    pub fn new(url: impl Into<String>, options: &LoadOptions) -> Self {
        Self {
            url: url.into(),
            method: options.resolved_method(),
            body: options.send_data.clone(),
            range: options.range,
            content_type: options.content_type.clone(),
            mime_type: options.mime_type.clone(),
            headers: options.headers.clone(),
            response_format: options.response_type.unwrap_or_default(),
            with_credentials: options.with_credentials,
            timeout: options.timeout,
            cross_origin_retried: false,
        }
    }
}

/// Body of a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Bytes(Bytes),
    Text(String),
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Bytes(b) => b.is_empty(),
            Payload::Text(s) => s.is_empty(),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Bytes(b) => b,
            Payload::Text(s) => Bytes::from(s.into_bytes()),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Payload::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
            Payload::Text(s) => s,
        }
    }
}
