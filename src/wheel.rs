//! Python wheel core metadata.
//!
//! A wheel is a ZIP archive whose `{name}-{version}.dist-info/METADATA` entry holds
//! the package's core metadata as RFC 822 style headers. Reading it through a
//! [`RangeFile`](crate::RangeFile) fetches the central directory and that one entry,
//! a small fraction of the archive.

use std::io::{Read, Seek};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{Error, Result};

const METADATA_SUFFIX: &str = ".dist-info/METADATA";

/// Last path segment of a path or URL, without query string or fragment.
pub fn file_name(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    let path = &location[..end];
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// `{name}-{version}` from a wheel file name such as `Django-3.0.1-py3-none-any.whl`.
pub fn dist_name(file_name: &str) -> Option<String> {
    let mut parts = file_name.splitn(3, '-');
    let name = parts.next().filter(|s| !s.is_empty())?;
    let version = parts.next().filter(|s| !s.is_empty())?;
    // A wheel name always carries tags after the version
    parts.next()?;
    Some(format!("{name}-{version}"))
}

/// Pick the metadata entry among `names`.
///
/// The `{dist}.dist-info/METADATA` entry wins when `dist` is given (compared
/// case-insensitively, since installers normalize project names). Otherwise the
/// archive must hold exactly one top-level `.dist-info/METADATA`.
pub fn find_metadata_entry<'a>(
    names: impl IntoIterator<Item = &'a str>,
    dist: Option<&str>,
) -> Option<String> {
    let candidates: Vec<&str> = names
        .into_iter()
        .filter(|name| name.ends_with(METADATA_SUFFIX) && name.matches('/').count() == 1)
        .collect();

    if let Some(dist) = dist {
        let wanted = format!("{dist}{METADATA_SUFFIX}");
        if let Some(found) = candidates.iter().find(|name| name.eq_ignore_ascii_case(&wanted)) {
            return Some(found.to_string());
        }
    }

    match candidates.as_slice() {
        [only] => Some(only.to_string()),
        _ => None,
    }
}

/// Locate and parse the wheel's core metadata.
pub fn read_metadata<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    dist: Option<&str>,
) -> Result<CoreMetadata> {
    let entry = find_metadata_entry(archive.file_names(), dist).ok_or(Error::MetadataNotFound)?;
    debug!(%entry, "reading wheel metadata");

    let mut file = archive.by_name(&entry)?;
    let mut raw = Vec::with_capacity(file.size().min(1 << 20) as usize);
    file.read_to_end(&mut raw)?;
    let text = String::from_utf8(raw)?;

    Ok(CoreMetadata::parse(&text))
}

/// Parsed core metadata: ordered headers plus the free-form body (usually the long
/// description).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreMetadata {
    headers: Vec<(String, String)>,
    body: String,
}

impl CoreMetadata {
    pub fn parse(text: &str) -> Self {
        let mut headers: Vec<(String, String)> = Vec::new();
        let mut lines = text.split('\n');
        let mut body_lines = Vec::new();

        for line in lines.by_ref() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                break;
            }

            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = headers.last_mut() {
                    value.push('\n');
                    value.push_str(line.trim_start());
                }
                continue;
            }

            match line.split_once(':') {
                Some((name, value)) => {
                    headers.push((name.trim().to_string(), value.trim().to_string()));
                }
                None => {
                    // Not a header: the body started without a separating blank line
                    body_lines.push(line);
                    break;
                }
            }
        }
        body_lines.extend(lines.map(|line| line.strip_suffix('\r').unwrap_or(line)));

        Self {
            headers,
            body: body_lines.join("\n"),
        }
    }

    /// First value of header `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Every value of header `name` (case-insensitive), in file order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
