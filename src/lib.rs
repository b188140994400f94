//! # quickread
//!
//! Read files out of large remote ZIP archives without downloading them.
//!
//! The centre of the crate is [`RangeFile`], a read-only seekable file backed by a
//! [`ByteSource`]. It behaves like a complete local copy to any reader built on
//! [`std::io::Read`] + [`std::io::Seek`] (for example [`zip::ZipArchive`]), while
//! fetching only the byte ranges that reader actually touches and never fetching a
//! byte twice.
//!
//! ## Byte sources
//!
//! - [`LocalFileSource`]: a file on disk
//! - [`HttpRangeSource`]: a remote resource fetched with HTTP Range requests
//!
//! ## Example
//!
//! ```no_run
//! use quickread::{HttpRangeSource, RangeFile, wheel};
//!
//! fn main() -> anyhow::Result<()> {
//!     let url = "https://example.com/packages/Django-3.0.1-py3-none-any.whl";
//!     let mut file = RangeFile::new(HttpRangeSource::new(url)?);
//!
//!     let mut archive = zip::ZipArchive::new(&mut file)?;
//!     let dist = wheel::dist_name(wheel::file_name(url));
//!     let metadata = wheel::read_metadata(&mut archive, dist.as_deref())?;
//!     for requirement in metadata.get_all("Requires-Dist") {
//!         println!("{requirement}");
//!     }
//!     drop(archive);
//!
//!     println!("transferred {} bytes", file.total_bytes_transferred());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod file;
pub mod io;
pub mod ranges;
pub mod wheel;

pub use cli::Cli;
pub use error::{Error, Result};
pub use file::{DEFAULT_MIN_FETCH_SIZE, RangeFile};
pub use io::{ByteSource, HttpRangeSource, LocalFileSource};
pub use ranges::{Interval, IntervalSet};
