//! HTTP/HTTPS transport.
//!
//! Responses are returned exactly as received: no automatic content
//! decoding, so ranged reads of compressed files keep their offsets.

use super::{Transport, WireRequest, WireResponse};
use crate::config::LoaderConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

pub struct HttpTransport {
    client: Client,
    /// Separate client with a cookie store, used for credentialed requests
    credentialed: Client,
}

impl HttpTransport {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::InvalidRequest(format!("failed to create HTTP client: {}", e)))?;

        let credentialed = Client::builder()
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .build()
            .map_err(|e| Error::InvalidRequest(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentialed,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse> {
        let client = if request.with_credentials {
            &self.credentialed
        } else {
            &self.client
        };

        debug!(
            method = %request.method,
            url = %request.url,
            range = ?request.headers.get(reqwest::header::RANGE),
            "sending request"
        );

        let mut builder = client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!(status, bytes = body.len(), "response received");

        Ok(WireResponse {
            status,
            headers,
            body,
        })
    }
}
