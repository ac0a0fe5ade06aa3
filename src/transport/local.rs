use super::{Transport, WireRequest, WireResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_RANGE, HeaderMap, HeaderValue, RANGE};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Serves `file://` URLs.
///
/// Whole reads report status 0, like a browser reading a local file. A
/// `Range` header is honoured with 206, or 416 when it starts past the end.
pub struct FileTransport;

#[async_trait]
impl Transport for FileTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse> {
        let path = request
            .url
            .to_file_path()
            .map_err(|_| Error::InvalidRequest(format!("not a file path: {}", request.url)))?;

        let range = request
            .headers
            .get(RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_range);

        let mut file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(status_only(404)),
            Err(source) => return Err(Error::LocalRead { path, source }),
        };
        let local_err = |source| Error::LocalRead {
            path: path.clone(),
            source,
        };

        let Some((start, end)) = range else {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf).await.map_err(local_err)?;
            return Ok(WireResponse {
                status: 0,
                headers: HeaderMap::new(),
                body: Bytes::from(buf),
            });
        };

        let len = file.metadata().await.map_err(local_err)?.len();
        if start >= len {
            return Ok(status_only(416));
        }
        let last = end.map_or(len - 1, |e| e.min(len - 1));

        file.seek(std::io::SeekFrom::Start(start))
            .await
            .map_err(local_err)?;
        let mut buf = Vec::with_capacity((last - start + 1) as usize);
        file.take(last - start + 1)
            .read_to_end(&mut buf)
            .await
            .map_err(local_err)?;

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("bytes {}-{}/{}", start, last, len)) {
            headers.insert(CONTENT_RANGE, value);
        }

        Ok(WireResponse {
            status: 206,
            headers,
            body: Bytes::from(buf),
        })
    }
}

/// Read a whole local file.
pub async fn read_local_file(path: &Path) -> Result<Bytes> {
    fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|source| Error::LocalRead {
            path: path.to_path_buf(),
            source,
        })
}

fn status_only(status: u16) -> WireResponse {
    WireResponse {
        status,
        headers: HeaderMap::new(),
        body: Bytes::new(),
    }
}

/// Parse `bytes=<start>-<end?>`.
fn parse_range(value: &str) -> Option<(u64, Option<u64>)> {
    let spec = value.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;
    let start = start.trim().parse().ok()?;
    let end = match end.trim() {
        "" => None,
        e => Some(e.parse().ok()?),
    };
    Some((start, end))
}
