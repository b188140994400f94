use std::io;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A non-success response, kept whole for diagnosis.
    #[error("HTTP {status} for {url}\n{headers:?}\n\n{body}")]
    Http {
        url: String,
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },

    /// A 206 response whose bytes do not start where they were asked for.
    #[error("{url} answered a range starting at byte {requested} with bytes from {received}")]
    RangeMismatch {
        url: String,
        requested: u64,
        received: u64,
    },

    #[error("{url} did not report a usable Content-Length")]
    MissingContentLength { url: String },

    #[error("invalid seek to negative position {offset}")]
    InvalidSeek { offset: i128 },

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("no .dist-info/METADATA entry found in archive")]
    MetadataNotFound,

    #[error("metadata is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::Unsupported(_) => io::Error::new(io::ErrorKind::Unsupported, err),
            Error::InvalidSeek { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            other => io::Error::other(other),
        }
    }
}
