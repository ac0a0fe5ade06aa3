use crate::types::{LoadOptions, ResponseFormat};
use crate::{Error, Result};
use clap::{Parser, ValueEnum};
use std::collections::HashMap;
use std::time::Duration;

/// Hosts whose caches mishandle partial responses unless the URL is unique.
pub const DEFAULT_CACHE_BUST_HOSTS: &[&str] = &["googleapis"];

/// Loader-wide settings. Fixed once the loader is built.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Proxy used to retry cross-origin loads that failed at the network level
    pub proxy: Option<String>,
    /// Origin of the hosting page; URLs outside it are cross-origin.
    /// With no origin every URL is cross-origin.
    pub origin: Option<String>,
    /// Default deadline for a single exchange
    pub timeout: Option<Duration>,
    /// Host substrings that get a random query parameter on range requests
    pub cache_bust_hosts: Vec<String>,
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            origin: None,
            timeout: None,
            cache_bust_hosts: DEFAULT_CACHE_BUST_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            user_agent: concat!("htsfetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Decompressed raw text
    #[value(name = "string")]
    Text,
    /// Undecoded response bytes
    Bytes,
    /// Parsed and pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "htsfetch")]
#[command(about = "Fetch genomic data files over HTTP or from disk")]
pub struct Config {
    /// URL or local file path to load
    pub source: String,

    /// First byte of the range to request
    #[arg(long)]
    pub start: Option<u64>,

    /// Number of bytes to request (open-ended if omitted)
    #[arg(long, requires = "start")]
    pub size: Option<u64>,

    /// Treat the resource as BGZF-compressed regardless of its name
    #[arg(long)]
    pub bgz: bool,

    /// What to load and print
    #[arg(short, long, value_enum, default_value = "string")]
    pub mode: OutputMode,

    /// HTTP method (defaults to POST with --data, GET otherwise)
    #[arg(long)]
    pub method: Option<String>,

    /// Request body
    #[arg(long)]
    pub data: Option<String>,

    /// Content-Type of the request body
    #[arg(long)]
    pub content_type: Option<String>,

    /// Extra header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Send cookies with the request
    #[arg(long)]
    pub with_credentials: bool,

    /// Proxy for retrying failed cross-origin requests
    #[arg(long, env = "HTSFETCH_PROXY")]
    pub proxy: Option<String>,

    /// Origin considered same-origin (e.g., https://igv.example.org)
    #[arg(long, env = "HTSFETCH_ORIGIN")]
    pub origin: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "HTSFETCH_TIMEOUT")]
    pub timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,
}

impl Config {
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            proxy: self.proxy.clone(),
            origin: self.origin.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
            ..LoaderConfig::default()
        }
    }

    pub fn load_options(&self) -> Result<LoadOptions> {
        let method = self
            .method
            .as_deref()
            .map(|m| {
                m.to_ascii_uppercase()
                    .parse::<reqwest::Method>()
                    .map_err(|e| Error::InvalidRequest(format!("invalid method {}: {}", m, e)))
            })
            .transpose()?;

        let mut options = LoadOptions {
            method,
            send_data: self.data.clone().map(Into::into),
            content_type: self.content_type.clone(),
            headers: parse_headers(&self.headers)?,
            with_credentials: self.with_credentials,
            bgz: self.bgz,
            ..LoadOptions::default()
        };
        if let Some(start) = self.start {
            options = options.with_range(start, self.size);
        }
        if self.mode == OutputMode::Bytes {
            options.response_type = Some(ResponseFormat::Bytes);
        }
        Ok(options)
    }

    /// Whether the source names a local file rather than a URL.
    pub fn is_local(&self) -> bool {
        url::Url::parse(&self.source)
            .map(|u| u.cannot_be_a_base() || u.scheme().len() == 1)
            .unwrap_or(true)
    }
}

fn parse_headers(raw: &[String]) -> Result<HashMap<String, String>> {
    raw.iter()
        .map(|h| {
            let (name, value) = h
                .split_once(':')
                .ok_or_else(|| Error::InvalidRequest(format!("header without ':': {}", h)))?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
