use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connectivity-level failure. The only error eligible for the
    /// cross-origin proxy fallback.
    #[error("network error: {0}")]
    Network(String),

    #[error("error accessing resource: {url} status: {status}")]
    HttpStatus { status: u16, url: String },

    /// HTTP 416: the requested offset lies past the end of the resource.
    #[error("unsatisfiable range: {url}")]
    RangeUnsatisfied { url: String },

    /// The server answered a range request with the whole resource.
    #[error("range header ignored: {url}")]
    RangeIgnored { url: String },

    #[error("load aborted")]
    Aborted,

    #[error("timed out")]
    TimedOut,

    #[error("invalid json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read local file {path:?}: {source}")]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Network(_) => "NetworkError",
            Error::HttpStatus { .. } => "HttpStatusError",
            Error::RangeUnsatisfied { .. } => "RangeUnsatisfiedError",
            Error::RangeIgnored { .. } => "RangeIgnoredError",
            Error::Aborted => "AbortError",
            Error::TimedOut => "TimeoutError",
            Error::Parse(_) => "ParseError",
            Error::LocalRead { .. } => "LocalReadError",
            Error::Decompress(_) => "DecompressError",
            Error::InvalidRequest(_) => "InvalidRequest",
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::RangeUnsatisfied { .. } => Some(416),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::TimedOut
        } else if e.is_builder() {
            Error::InvalidRequest(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidRequest(format!("invalid url: {}", e))
    }
}
