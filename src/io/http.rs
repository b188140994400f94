use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, HeaderMap, RANGE};
use tracing::{debug, warn};

use super::ByteSource;
use crate::error::{Error, Result};
use crate::ranges::Interval;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Byte source over a remote resource, fetched with HTTP Range requests
pub struct HttpRangeSource {
    client: Client,
    url: String,
    size: Option<u64>,
    requests: u64,
}

impl HttpRangeSource {
    /// Create a source for `url`. No request is sent until bytes or the size are
    /// needed.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            size: None,
            requests: 0,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of HTTP requests (GET and HEAD) sent so far
    pub fn request_count(&self) -> u64 {
        self.requests
    }

    /// Turn a non-success response into an error carrying status, headers and body
    fn check_status(&self, resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let headers = resp.headers().clone();
        let body = resp.text().unwrap_or_default();
        Err(Error::Http {
            url: self.url.clone(),
            status,
            headers,
            body,
        })
    }
}

/// What one ranged GET produced
enum Window {
    /// Bytes starting exactly at the requested offset; possibly fewer than asked
    Partial(Vec<u8>),
    /// The server ignored Range and sent the whole resource
    Whole(Vec<u8>),
    /// 416: nothing at or after the requested offset
    End,
}

impl HttpRangeSource {
    fn request_window(&mut self, window: Interval) -> Result<Window> {
        let header = range_header(&window);
        debug!(url = %self.url, range = %header, "range request");

        self.requests += 1;
        let resp = self.client.get(&self.url).header(RANGE, &header).send()?;

        if resp.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            let total = ContentRange::from_headers(resp.headers()).and_then(|cr| cr.total);
            if let Some(total) = total {
                self.size.get_or_insert(total);
            }
            return Ok(Window::End);
        }

        let resp = self.check_status(resp)?;
        let status = resp.status();
        let content_range = ContentRange::from_headers(resp.headers());
        let body = resp.bytes()?;

        if status != StatusCode::PARTIAL_CONTENT {
            warn!(url = %self.url, %status, "server ignored Range header");
            self.size.get_or_insert(body.len() as u64);
            return Ok(Window::Whole(body.to_vec()));
        }

        if let Some(content_range) = content_range {
            if let Some(total) = content_range.total {
                self.size.get_or_insert(total);
            }
            if let Some(first) = content_range.first
                && first != window.start
            {
                return Err(Error::RangeMismatch {
                    url: self.url.clone(),
                    requested: window.start,
                    received: first,
                });
            }
        }

        let mut data = body.to_vec();
        if let Some(len) = window.len() {
            data.truncate(len as usize);
        }
        Ok(Window::Partial(data))
    }
}

impl ByteSource for HttpRangeSource {
    /// Servers may answer with less than asked (some cap the size of a range), so
    /// the remainder is requested until the range or the data is exhausted.
    fn fetch(&mut self, range: Interval) -> Result<Vec<u8>> {
        let mut data = Vec::new();

        loop {
            let window = Interval {
                start: range.start + data.len() as u64,
                end: range.end,
            };
            if window.is_empty() || self.size.is_some_and(|size| window.start >= size) {
                break;
            }

            match self.request_window(window)? {
                Window::Partial(bytes) if bytes.is_empty() => break,
                Window::Partial(bytes) => data.extend_from_slice(&bytes),
                Window::Whole(body) => {
                    let size = body.len() as u64;
                    let start = range.start.min(size) as usize;
                    let end = range.end.map_or(size, |end| end.min(size)) as usize;
                    return Ok(body[start..end].to_vec());
                }
                Window::End => break,
            }
        }

        Ok(data)
    }

    fn total_size(&mut self) -> Result<u64> {
        if let Some(size) = self.size {
            return Ok(size);
        }

        debug!(url = %self.url, "resolving size with HEAD");
        self.requests += 1;
        let resp = self.client.head(&self.url).send()?;
        let resp = self.check_status(resp)?;

        let accepts_bytes = resp
            .headers()
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("bytes"));
        if !accepts_bytes {
            warn!(url = %self.url, "server does not advertise byte range support");
        }

        let size = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| Error::MissingContentLength {
                url: self.url.clone(),
            })?;

        self.size = Some(size);
        Ok(size)
    }
}

/// `bytes=start-last` for bounded ranges, `bytes=start-` for open ones
fn range_header(range: &Interval) -> String {
    match range.end {
        Some(end) => format!("bytes={}-{}", range.start, end - 1),
        None => format!("bytes={}-", range.start),
    }
}

/// A parsed `Content-Range: bytes first-last/total` header. `*` in either place
/// leaves the field unknown.
#[derive(Debug, PartialEq, Eq)]
struct ContentRange {
    first: Option<u64>,
    total: Option<u64>,
}

impl ContentRange {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        Self::parse(headers.get(CONTENT_RANGE)?.to_str().ok()?)
    }

    fn parse(value: &str) -> Option<Self> {
        let (span, total) = value.trim().strip_prefix("bytes ")?.split_once('/')?;
        let first = match span.trim() {
            "*" => None,
            span => Some(span.split_once('-')?.0.trim().parse().ok()?),
        };
        Some(Self {
            first,
            total: total.trim().parse().ok(),
        })
    }
}
