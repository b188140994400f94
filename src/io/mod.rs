mod http;
mod local;

pub use http::HttpRangeSource;
pub use local::LocalFileSource;

use crate::error::Result;
use crate::ranges::Interval;

/// Where the bytes behind a [`RangeFile`](crate::RangeFile) come from.
///
/// A source hands back the bytes of a requested range, or fewer of them when the
/// range runs past the end of the data. Adding a backend means implementing these
/// three operations.
pub trait ByteSource {
    /// Fetch the bytes of `range`. An unbounded range means "to end of data".
    fn fetch(&mut self, range: Interval) -> Result<Vec<u8>>;

    /// Total length of the underlying data.
    fn total_size(&mut self) -> Result<u64>;

    /// Release the underlying handle. Dropping the source releases it as well;
    /// `close` only exists so a caller can observe a failure.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn fetch(&mut self, range: Interval) -> Result<Vec<u8>> {
        (**self).fetch(range)
    }

    fn total_size(&mut self) -> Result<u64> {
        (**self).total_size()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn fetch(&mut self, range: Interval) -> Result<Vec<u8>> {
        (**self).fetch(range)
    }

    fn total_size(&mut self) -> Result<u64> {
        (**self).total_size()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
