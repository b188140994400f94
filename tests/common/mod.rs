#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const METADATA: &str = "Metadata-Version: 2.1\n\
Name: demo\n\
Version: 1.0\n\
Summary: Demo package\n\
Requires-Dist: requests (>=2.0)\n\
Requires-Dist: click\n\
\n\
Long description.\n";

/// Bytes that never contain a ZIP signature, so they cannot confuse the
/// end-of-central-directory search.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

/// A wheel-shaped archive: a large stored payload up front, small metadata at the end.
pub fn wheel_archive(payload_len: usize) -> Vec<u8> {
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("demo/data.bin", stored).unwrap();
    writer.write_all(&payload(payload_len)).unwrap();
    writer.start_file("demo/__init__.py", deflated).unwrap();
    writer.write_all(b"VERSION = '1.0'\n").unwrap();
    writer.start_file("demo-1.0.dist-info/METADATA", deflated).unwrap();
    writer.write_all(METADATA.as_bytes()).unwrap();
    writer.start_file("demo-1.0.dist-info/RECORD", deflated).unwrap();
    writer.write_all(b"demo/__init__.py,,\n").unwrap();
    writer.finish().unwrap().into_inner()
}
