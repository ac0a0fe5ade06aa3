//! Compression detection and decoding for fetched resources.
//!
//! The kind of compression is decided once per load from the resource name
//! (or an explicit BGZF flag) and then passed explicitly to the decoder. The
//! same decision procedure is used for URLs and for local files.
//!
//! # Example
//!
//! ```
//! use htsfetch::compression::{detect, CompressionKind};
//!
//! assert_eq!(detect("sample.vcf.gz?token=abc", false), CompressionKind::Gzip);
//! assert_eq!(detect("sample.bam", true), CompressionKind::Bgzf);
//! ```

mod decode;

pub use decode::{bytes_to_raw_string, raw_string_to_bytes, to_bytes};

/// Compression applied to a resource's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionKind {
    #[default]
    None,
    Gzip,
    /// Blocked gzip, as used by indexed genomic formats
    Bgzf,
}

impl CompressionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bgzf => "bgzf",
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Decide the compression of a resource.
///
/// An explicit `bgz` flag wins. Otherwise the name, with any query string or
/// fragment removed, selects gzip when it ends in `.gz`.
pub fn detect(name_or_url: &str, bgz: bool) -> CompressionKind {
    if bgz {
        return CompressionKind::Bgzf;
    }

    if strip_parameters(name_or_url).ends_with(".gz") {
        CompressionKind::Gzip
    } else {
        CompressionKind::None
    }
}

/// Decide the compression of a local file from its name.
///
/// File names carry no query string, so `?` and `#` are part of the name.
pub fn detect_file_name(file_name: &str, bgz: bool) -> CompressionKind {
    if bgz {
        CompressionKind::Bgzf
    } else if file_name.ends_with(".gz") {
        CompressionKind::Gzip
    } else {
        CompressionKind::None
    }
}

/// Drop the query string and fragment from a URL or file name.
pub fn strip_parameters(name_or_url: &str) -> &str {
    match name_or_url.find(['?', '#']) {
        Some(idx) if idx > 0 => &name_or_url[..idx],
        _ => name_or_url,
    }
}
