//! Transport abstraction for a single request/response exchange.
//!
//! The loader only ever talks to a [`Transport`]; concrete transports decide
//! how the bytes move.
//!
//! # Implementations
//!
//! - [`HttpTransport`] - HTTP(S) via `reqwest`
//! - [`FileTransport`] - `file://` URLs on the local filesystem
//! - [`SchemeTransport`] - routes by URL scheme to one of the above
//!
//! Transports report connectivity failures as [`Error::Network`](crate::Error::Network)
//! and leave status interpretation to the caller. A completed exchange is
//! always `Ok`, whatever its status.

mod http;
mod local;

pub use http::HttpTransport;
pub use local::{FileTransport, read_local_file};

use crate::Result;
use crate::config::LoaderConfig;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use reqwest::header::HeaderMap;
use url::Url;

/// A request as it goes on the wire
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// Include cookies/credentials
    pub with_credentials: bool,
}

/// A completed exchange
#[derive(Debug, Clone)]
pub struct WireResponse {
    /// 0 when the source has no HTTP semantics
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// One request/response exchange
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: WireRequest) -> Result<WireResponse>;
}

/// Sends `file://` URLs to the filesystem and everything else over HTTP.
pub struct SchemeTransport {
    http: HttpTransport,
    file: FileTransport,
}

impl SchemeTransport {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        Ok(Self {
            http: HttpTransport::new(config)?,
            file: FileTransport,
        })
    }
}

#[async_trait]
impl Transport for SchemeTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse> {
        if request.url.scheme() == "file" {
            self.file.send(request).await
        } else {
            self.http.send(request).await
        }
    }
}
