use super::CompressionKind;
use crate::{Error, Result};
use flate2::read::MultiGzDecoder;
use noodles::bgzf;
use std::io::Read;
use tokio::io::AsyncReadExt;

/// Decompress `raw` according to `kind`.
pub async fn to_bytes(raw: &[u8], kind: CompressionKind) -> Result<Vec<u8>> {
    if raw.is_empty() && kind.is_compressed() {
        return Err(Error::Decompress(format!("{}: empty input", kind.name())));
    }

    match kind {
        CompressionKind::None => Ok(raw.to_vec()),
        CompressionKind::Gzip => gunzip(raw),
        CompressionKind::Bgzf => unbgzf(raw).await,
    }
}

fn gunzip(raw: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = MultiGzDecoder::new(raw);
    let mut plain = Vec::new();
    decoder
        .read_to_end(&mut plain)
        .map_err(|e| Error::Decompress(format!("gzip: {}", e)))?;
    Ok(plain)
}

async fn unbgzf(raw: &[u8]) -> Result<Vec<u8>> {
    let mut reader = bgzf::r#async::Reader::new(raw);
    let mut plain = Vec::new();
    reader
        .read_to_end(&mut plain)
        .await
        .map_err(|e| Error::Decompress(format!("bgzf: {}", e)))?;
    Ok(plain)
}

/// Map every byte to the char with the same code point (0..=255).
///
/// Downstream parsers index the result by char position as if it were a
/// byte offset, so the output always has exactly one char per input byte.
pub fn bytes_to_raw_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Inverse of [`bytes_to_raw_string`]. `None` if a char is above U+00FF.
pub fn raw_string_to_bytes(s: &str) -> Option<Vec<u8>> {
    s.chars().map(|c| u8::try_from(c).ok()).collect()
}
