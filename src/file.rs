//! The range-tracked virtual file.
//!
//! [`RangeFile`] looks like an ordinary seekable file to anything that reads through
//! [`std::io::Read`] and [`std::io::Seek`], such as [`zip::ZipArchive`]. Behind that
//! it keeps a local buffer and an [`IntervalSet`] of the spans already fetched, and
//! only asks its [`ByteSource`] for bytes it has never seen.
//!
//! ```no_run
//! use quickread::{HttpRangeSource, RangeFile};
//!
//! # fn main() -> quickread::Result<()> {
//! let source = HttpRangeSource::new("https://example.com/pkg-1.0-py3-none-any.whl")?;
//! let mut file = RangeFile::new(source).with_min_fetch_size(16 * 1024);
//! let mut archive = zip::ZipArchive::new(&mut file)?;
//! println!("{} entries", archive.len());
//! drop(archive);
//! println!("{:.2}% transferred", file.transferred_ratio()? * 100.0);
//! # Ok(())
//! # }
//! ```

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::ops::Range;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::io::ByteSource;
use crate::ranges::{Interval, IntervalSet};

/// Smallest number of bytes requested from the source on a miss
pub const DEFAULT_MIN_FETCH_SIZE: u64 = 100;

/// A read-only, seekable view of a [`ByteSource`] that fetches lazily and never
/// fetches the same byte twice.
///
/// The local buffer is a single contiguous allocation sized to the highest offset
/// ever fetched, with unfetched bytes zero-filled. Reading the end of an archive
/// (where its central directory lives) therefore allocates about the archive's
/// whole size in memory, even though only a few spans are transferred.
pub struct RangeFile<S: ByteSource> {
    source: S,
    cursor: u64,
    buffer: Vec<u8>,
    materialized: IntervalSet,
    total_size: Option<u64>,
    min_fetch_size: u64,
}

impl<S: ByteSource> RangeFile<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cursor: 0,
            buffer: Vec::new(),
            materialized: IntervalSet::new(),
            total_size: None,
            min_fetch_size: DEFAULT_MIN_FETCH_SIZE,
        }
    }

    /// Floor applied to every fetch so that small structural reads share a request.
    pub fn with_min_fetch_size(mut self, min_fetch_size: u64) -> Self {
        self.min_fetch_size = min_fetch_size;
        self
    }

    pub fn tell(&self) -> u64 {
        self.cursor
    }

    /// Move the cursor. Seeking past the end is allowed; reads there come back empty.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => self.cursor as i128 + delta as i128,
            SeekFrom::End(delta) => self.total_size()? as i128 + delta as i128,
        };
        if target < 0 {
            return Err(Error::InvalidSeek { offset: target });
        }
        self.cursor = u64::try_from(target).map_err(|_| Error::InvalidSeek { offset: target })?;
        Ok(self.cursor)
    }

    /// Read up to `len` bytes at the cursor, or everything to the end of the data
    /// when `len` is `None`. A short result means end of data was reached.
    pub fn read_span(&mut self, len: Option<usize>) -> Result<Vec<u8>> {
        let span = self.serve(len.map(|n| n as u64))?;
        Ok(self.buffer[span].to_vec())
    }

    /// Total length of the underlying data, resolved from the source at most once.
    pub fn total_size(&mut self) -> Result<u64> {
        if let Some(size) = self.total_size {
            return Ok(size);
        }
        let size = self.source.total_size()?;
        self.total_size = Some(size);
        Ok(size)
    }

    /// Bytes obtained from the source so far.
    pub fn total_bytes_transferred(&self) -> u64 {
        self.materialized.total_covered_length()
    }

    /// Fraction of the underlying data that has been transferred.
    pub fn transferred_ratio(&mut self) -> Result<f64> {
        let size = self.total_size()?;
        if size == 0 {
            return Ok(0.0);
        }
        Ok(self.total_bytes_transferred() as f64 / size as f64)
    }

    pub fn materialized(&self) -> &IntervalSet {
        &self.materialized
    }

    pub fn min_fetch_size(&self) -> u64 {
        self.min_fetch_size
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_readable(&self) -> bool {
        true
    }

    pub fn is_writable(&self) -> bool {
        false
    }

    pub fn is_seekable(&self) -> bool {
        true
    }

    pub fn write(&mut self, _data: &[u8]) -> Result<usize> {
        Err(Error::Unsupported("write"))
    }

    pub fn set_len(&mut self, _size: u64) -> Result<()> {
        Err(Error::Unsupported("truncate"))
    }

    /// Close the underlying source and surface any failure doing so.
    pub fn close(mut self) -> Result<()> {
        self.source.close()
    }

    /// Give the source back, discarding everything fetched.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Make sure the requested span is materialized as far as the data goes, then
    /// advance the cursor over it and return its location in `buffer`.
    fn serve(&mut self, len: Option<u64>) -> Result<Range<usize>> {
        let start = self.cursor;
        let requested = match (len, self.total_size) {
            (Some(n), _) => Interval::new(start, start.saturating_add(n)),
            (None, Some(size)) => Interval::new(start, size.max(start)),
            (None, None) => Interval::starting_at(start),
        };
        if requested.is_empty() {
            return Ok(0..0);
        }

        if self.materialized.covers(&requested) {
            trace!(%requested, "served from buffer");
        } else {
            self.materialize(&requested)?;
        }

        let Some(run) = self.materialized.range_containing(start) else {
            return Ok(0..0);
        };
        let end = requested.end.map_or(run.end, |end| end.min(run.end));
        self.cursor = end;
        Ok(start as usize..end as usize)
    }

    /// Fetch every gap of `requested` from the source. Only the last gap is widened
    /// to `min_fetch_size`, and never into bytes that are already held.
    fn materialize(&mut self, requested: &Interval) -> Result<()> {
        let gaps = self.materialized.gaps(requested);
        let last = gaps.len().saturating_sub(1);

        for (i, gap) in gaps.into_iter().enumerate() {
            let fetch = if i == last { self.widen(gap) } else { gap };
            if fetch.is_empty() {
                break;
            }

            let data = self.source.fetch(fetch)?;
            debug!(%fetch, received = data.len(), "fetched from source");

            if data.is_empty() {
                // fetch.start is at or past the end; where the end lies is the
                // source's answer, not ours
                break;
            }

            let short = fetch.len().is_none_or(|want| (data.len() as u64) < want);
            if short {
                // The data ends right after what came back
                self.total_size.get_or_insert(fetch.start + data.len() as u64);
            }
            self.store(fetch.start, &data);
            if short {
                break;
            }
        }
        Ok(())
    }

    fn widen(&self, gap: Interval) -> Interval {
        let Some(end) = gap.end else {
            return gap;
        };
        let mut end = end.max(gap.start.saturating_add(self.min_fetch_size));
        if let Some(next) = self.materialized.next_start_after(gap.start) {
            end = end.min(next);
        }
        if let Some(size) = self.total_size {
            end = end.min(size.max(gap.start));
        }
        Interval::new(gap.start, end)
    }

    /// Copy `data` into the buffer at `offset`. Every write here is paired with an
    /// insert of exactly the same extent.
    fn store(&mut self, offset: u64, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let start = offset as usize;
        let end = start + data.len();
        if self.buffer.len() < end {
            self.buffer.resize(end, 0);
        }
        self.buffer[start..end].copy_from_slice(data);
        self.materialized.insert(offset..end as u64);
    }
}

impl<S: ByteSource> Read for RangeFile<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let span = self.serve(Some(buf.len() as u64))?;
        let n = span.len();
        buf[..n].copy_from_slice(&self.buffer[span]);
        Ok(n)
    }
}

impl<S: ByteSource> Seek for RangeFile<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(RangeFile::seek(self, pos)?)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.cursor)
    }
}

impl<S: ByteSource> Write for RangeFile<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(RangeFile::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(Error::Unsupported("flush").into())
    }
}
