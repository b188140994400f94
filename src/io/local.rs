use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use super::ByteSource;
use crate::error::Result;
use crate::ranges::Interval;

/// Byte source over a file on local disk
pub struct LocalFileSource {
    file: File,
    position: u64,
    size: Option<u64>,
}

impl LocalFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }

    pub fn new(file: File) -> Self {
        Self {
            file,
            position: 0,
            size: None,
        }
    }
}

impl ByteSource for LocalFileSource {
    fn fetch(&mut self, range: Interval) -> Result<Vec<u8>> {
        if self.position != range.start {
            self.position = self.file.seek(SeekFrom::Start(range.start))?;
        }

        let mut data = Vec::new();
        match range.len() {
            Some(len) => (&mut self.file).take(len).read_to_end(&mut data)?,
            None => self.file.read_to_end(&mut data)?,
        };
        self.position += data.len() as u64;

        debug!(%range, read = data.len(), "local fetch");
        Ok(data)
    }

    fn total_size(&mut self) -> Result<u64> {
        if let Some(size) = self.size {
            return Ok(size);
        }

        // Probe the end, then put the handle back where fetch expects it
        let size = self.file.seek(SeekFrom::End(0))?;
        self.file.seek(SeekFrom::Start(self.position))?;
        self.size = Some(size);
        Ok(size)
    }
}
