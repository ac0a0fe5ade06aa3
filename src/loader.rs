//! Resource loader: the public entry points for fetching data.
//!
//! A load runs as a small state machine. The first exchange either reaches a
//! terminal outcome (success, unsatisfiable range, HTTP or range error,
//! abort, timeout) or fails at the network level. A network failure of a
//! cross-origin load may go through the configured proxy once; whatever that
//! second exchange yields is final.
//!
//! # Example
//!
//! ```no_run
//! use htsfetch::{LoaderConfig, ResourceLoader};
//! use htsfetch::types::LoadOptions;
//!
//! # async fn run() -> htsfetch::Result<()> {
//! let loader = ResourceLoader::new(LoaderConfig::default())?;
//! let header = loader
//!     .load_bytes(
//!         "https://example.com/sample.bam",
//!         &LoadOptions::default().with_range(0, Some(65536)),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::compression::{self, CompressionKind, bytes_to_raw_string};
use crate::config::LoaderConfig;
use crate::fallback;
use crate::response::classify;
use crate::transport::{SchemeTransport, Transport, WireResponse, read_local_file};
use crate::types::{LoadOptions, LoadRequest, Payload, RAW_TEXT_MIME, ResponseFormat};
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::Method;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct ResourceLoader {
    transport: Arc<dyn Transport>,
    config: LoaderConfig,
}

impl ResourceLoader {
    /// Loader over HTTP(S) and `file://`.
    pub fn new(config: LoaderConfig) -> Result<Self> {
        let transport = Arc::new(SchemeTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: LoaderConfig, transport: Arc<dyn Transport>) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load `url` and return the body in the requested response format.
    pub async fn load(&self, url: &str, options: &LoadOptions) -> Result<Payload> {
        let request = LoadRequest::new(url, options);
        let cancel = options.cancel.as_ref();

        match self.attempt(&request, cancel).await {
            Err(err) if err.is_network() => match fallback::maybe_retry(&request, &self.config) {
                Some(retry) => {
                    warn!(url = %request.url, proxy = %retry.url, error = %err, "retrying through proxy");
                    self.attempt(&retry, cancel).await
                }
                None => Err(err),
            },
            outcome => outcome,
        }
    }

    /// Load raw, undecoded bytes.
    pub async fn load_bytes(&self, url: &str, options: &LoadOptions) -> Result<Bytes> {
        let options = LoadOptions {
            response_type: Some(ResponseFormat::Bytes),
            ..options.clone()
        };
        self.load(url, &options).await.map(Payload::into_bytes)
    }

    /// Load and parse JSON. An empty body yields `None`.
    pub async fn load_json(
        &self,
        url: &str,
        options: &LoadOptions,
    ) -> Result<Option<serde_json::Value>> {
        let mut options = LoadOptions {
            response_type: Some(ResponseFormat::Text),
            ..options.clone()
        };
        if options.resolved_method() == Method::POST {
            options.content_type = Some("application/json".to_string());
        }

        let text = self.load(url, &options).await?.into_text();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Load a resource as a raw string (one char per decompressed byte),
    /// decompressing gzip or BGZF content on the way.
    pub async fn load_string(&self, url: &str, options: &LoadOptions) -> Result<String> {
        let kind = compression::detect(url, options.bgz);
        debug!(url, compression = kind.name(), "loading string");

        if kind == CompressionKind::None {
            let options = LoadOptions {
                response_type: Some(ResponseFormat::Text),
                mime_type: Some(RAW_TEXT_MIME.to_string()),
                ..options.clone()
            };
            return self.load(url, &options).await.map(Payload::into_text);
        }

        let raw = self.load_bytes(url, options).await?;
        decode_to_string(&raw, kind).await
    }

    /// Read a whole local file as a raw string. Byte ranges do not apply to
    /// local files and are ignored.
    pub async fn load_string_from_file(
        &self,
        path: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> Result<String> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = compression::detect_file_name(&name, options.bgz);

        if options.range.is_some() {
            debug!(path = %path.display(), "byte range ignored for local file");
        }
        debug!(path = %path.display(), compression = kind.name(), "loading local file");

        let raw = cancellable(options.cancel.as_ref(), read_local_file(path)).await?;
        decode_to_string(&raw, kind).await
    }

    /// One exchange: build, send, classify, interpret.
    async fn attempt(
        &self,
        request: &LoadRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<Payload> {
        let wire = crate::request::build(request, &self.config.cache_bust_hosts)?;
        let deadline = request.timeout.or(self.config.timeout);

        let exchange = async {
            match deadline {
                Some(deadline) => tokio::time::timeout(deadline, self.transport.send(wire))
                    .await
                    .map_err(|_| Error::TimedOut)?,
                None => self.transport.send(wire).await,
            }
        };
        let response = cancellable(cancel, exchange).await?;

        if let Some(err) =
            classify(response.status, request.range.is_some()).into_error(&request.url)
        {
            return Err(err);
        }
        Ok(interpret(request, response))
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<T>(
    cancel: Option<&CancellationToken>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    let Some(token) = cancel else {
        return fut.await;
    };

    tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!("load aborted");
            Err(Error::Aborted)
        }
        result = fut => result,
    }
}

fn interpret(request: &LoadRequest, response: WireResponse) -> Payload {
    match request.response_format {
        ResponseFormat::Bytes => Payload::Bytes(response.body),
        ResponseFormat::Text if is_raw_mime(request.mime_type.as_deref()) => {
            Payload::Text(bytes_to_raw_string(&response.body))
        }
        ResponseFormat::Text => Payload::Text(String::from_utf8_lossy(&response.body).into_owned()),
    }
}

fn is_raw_mime(mime: Option<&str>) -> bool {
    mime.is_some_and(|m| m.contains("x-user-defined"))
}

async fn decode_to_string(raw: &[u8], kind: CompressionKind) -> Result<String> {
    let plain = compression::to_bytes(raw, kind).await?;
    Ok(bytes_to_raw_string(&plain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::WireRequest;
    use async_trait::async_trait;
    use reqwest::header::HeaderMap;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned outcomes; pends forever once they run out.
    #[derive(Default)]
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<WireResponse>>>,
        seen: Mutex<Vec<WireRequest>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<WireResponse>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<WireRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: WireRequest) -> Result<WireResponse> {
            self.seen.lock().unwrap().push(request);
            let next = self.outcomes.lock().unwrap().pop_front();
            match next {
                Some(outcome) => outcome,
                None => std::future::pending().await,
            }
        }
    }

    fn ok(status: u16, body: &[u8]) -> Result<WireResponse> {
        Ok(WireResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::copy_from_slice(body),
        })
    }

    fn network_error() -> Result<WireResponse> {
        Err(Error::Network("connection refused".to_string()))
    }

    fn proxied_config() -> LoaderConfig {
        LoaderConfig {
            proxy: Some("https://igv.org/proxy".to_string()),
            origin: Some("https://igv.org".to_string()),
            ..LoaderConfig::default()
        }
    }

    fn loader(config: LoaderConfig, transport: &Arc<ScriptedTransport>) -> ResourceLoader {
        ResourceLoader::with_transport(config, transport.clone())
    }

    #[tokio::test]
    async fn test_fallback_fires_once() {
        let transport = ScriptedTransport::new(vec![network_error(), network_error()]);
        let loader = loader(proxied_config(), &transport);

        let err = loader
            .load("https://data.example.com/a.bed", &LoadOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_network());

        let seen = transport.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].url.as_str(), "https://igv.org/proxy");
        assert_eq!(seen[1].method, Method::POST);
        assert_eq!(
            seen[1].body.as_deref(),
            Some(&b"url=https%3A%2F%2Fdata.example.com%2Fa.bed"[..])
        );
    }

    #[tokio::test]
    async fn test_fallback_success() {
        let transport = ScriptedTransport::new(vec![network_error(), ok(200, b"chr1\t1\t2\n")]);
        let loader = loader(proxied_config(), &transport);

        let payload = loader
            .load("https://data.example.com/a.bed", &LoadOptions::default())
            .await
            .unwrap();
        assert_eq!(payload, Payload::Text("chr1\t1\t2\n".to_string()));
    }

    #[tokio::test]
    async fn test_no_fallback_for_same_origin() {
        let transport = ScriptedTransport::new(vec![network_error()]);
        let loader = loader(proxied_config(), &transport);

        let err = loader
            .load("https://igv.org/data/a.bed", &LoadOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_network());
        assert_eq!(transport.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_http_error_not_retried() {
        let transport = ScriptedTransport::new(vec![ok(500, b"")]);
        let loader = loader(proxied_config(), &transport);

        let err = loader
            .load("https://data.example.com/a.bed", &LoadOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_range_ignored_never_success() {
        let transport = ScriptedTransport::new(vec![ok(200, b"the whole file")]);
        let loader = loader(LoaderConfig::default(), &transport);

        let err = loader
            .load_bytes(
                "https://data.example.com/a.bam",
                &LoadOptions::default().with_range(0, Some(4)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RangeIgnored { .. }));
    }

    #[tokio::test]
    async fn test_range_unsatisfied() {
        let transport = ScriptedTransport::new(vec![ok(416, b"")]);
        let loader = loader(LoaderConfig::default(), &transport);

        let err = loader
            .load_bytes(
                "https://data.example.com/a.bam",
                &LoadOptions::default().with_range(1 << 40, None),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RangeUnsatisfied { .. }));
    }

    #[tokio::test]
    async fn test_abort_in_flight() {
        let transport = ScriptedTransport::new(vec![]);
        let loader = loader(proxied_config(), &transport);
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = loader
            .load(
                "https://data.example.com/a.bed",
                &LoadOptions::default().with_cancel(token),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Aborted));
        assert_eq!(transport.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_not_retried() {
        let transport = ScriptedTransport::new(vec![]);
        let loader = loader(proxied_config(), &transport);

        let err = loader
            .load(
                "https://data.example.com/a.bed",
                &LoadOptions::default().with_timeout(Duration::from_millis(20)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TimedOut));
        assert_eq!(transport.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_load_json() {
        let transport = ScriptedTransport::new(vec![ok(200, b""), ok(200, br#"{"a":1}"#), ok(200, b"{")]);
        let loader = loader(LoaderConfig::default(), &transport);
        let url = "https://data.example.com/tracks.json";

        assert_eq!(loader.load_json(url, &LoadOptions::default()).await.unwrap(), None);
        assert_eq!(
            loader.load_json(url, &LoadOptions::default()).await.unwrap(),
            Some(serde_json::json!({"a": 1}))
        );
        assert!(matches!(
            loader.load_json(url, &LoadOptions::default()).await,
            Err(Error::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_load_json_post_sets_content_type() {
        let transport = ScriptedTransport::new(vec![ok(200, b"[]")]);
        let loader = loader(LoaderConfig::default(), &transport);

        let value = loader
            .load_json(
                "https://data.example.com/search",
                &LoadOptions::default().with_body(r#"{"q":"BRCA1"}"#),
            )
            .await
            .unwrap();
        assert_eq!(value, Some(serde_json::json!([])));

        let seen = transport.seen();
        assert_eq!(seen[0].method, Method::POST);
        assert_eq!(seen[0].headers[reqwest::header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_load_string_uncompressed_is_raw() {
        let transport = ScriptedTransport::new(vec![ok(200, &[0x41, 0xff, 0x0a])]);
        let loader = loader(LoaderConfig::default(), &transport);

        let text = loader
            .load_string("https://data.example.com/a.bed?x=1", &LoadOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "A\u{ff}\n");
    }

    #[test]
    fn test_interpret_text_utf8_without_override() {
        let request = LoadRequest::new("https://x/a.json", &LoadOptions::default());
        let response = WireResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: Bytes::from("héllo"),
        };
        assert_eq!(interpret(&request, response), Payload::Text("héllo".to_string()));
    }
}
