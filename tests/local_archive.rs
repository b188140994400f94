mod common;

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};

use quickread::{LocalFileSource, RangeFile, wheel};
use zip::ZipArchive;

fn write_temp(data: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

fn open(path: &std::path::Path, min_fetch_size: u64) -> RangeFile<LocalFileSource> {
    RangeFile::new(LocalFileSource::open(path).unwrap()).with_min_fetch_size(min_fetch_size)
}

#[test]
fn whole_file_matches_direct_read() {
    let archive = common::wheel_archive(10_000);
    let temp = write_temp(&archive);
    let mut file = open(temp.path(), 100);

    let mut via_range_file = Vec::new();
    file.read_to_end(&mut via_range_file).unwrap();

    assert_eq!(via_range_file, fs::read(temp.path()).unwrap());
    assert_eq!(file.total_bytes_transferred(), archive.len() as u64);
    assert_eq!(file.materialized().len(), 1);
    assert_eq!(file.transferred_ratio().unwrap(), 1.0);
}

#[test]
fn scattered_reads_match_direct_read() {
    let archive = common::wheel_archive(4_000);
    let temp = write_temp(&archive);
    let mut file = open(temp.path(), 64);

    for (offset, len) in [(3_000u64, 17usize), (10, 300), (3_010, 40), (0, 5), (2_990, 100)] {
        file.seek(SeekFrom::Start(offset)).unwrap();
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf).unwrap();
        let start = offset as usize;
        assert_eq!(buf, archive[start..start + len], "read at {offset}");
    }

    let covered: u64 = file.materialized().iter().map(|r| r.end - r.start).sum();
    assert_eq!(file.total_bytes_transferred(), covered);
    assert!(file.total_bytes_transferred() < archive.len() as u64);
}

#[test]
fn zip_reader_touches_only_what_it_needs() {
    let archive = common::wheel_archive(1 << 20);
    let temp = write_temp(&archive);
    let mut file = open(temp.path(), 4096);

    let mut zip = ZipArchive::new(&mut file).unwrap();
    let names: Vec<_> = zip.file_names().map(str::to_string).collect();
    assert!(names.contains(&"demo-1.0.dist-info/METADATA".to_string()));

    let mut init = String::new();
    zip.by_name("demo/__init__.py").unwrap().read_to_string(&mut init).unwrap();
    assert_eq!(init, "VERSION = '1.0'\n");
    drop(zip);

    let ratio = file.transferred_ratio().unwrap();
    assert!(ratio < 0.2, "transferred {:.2}% of the archive", ratio * 100.0);
}

#[test]
fn rereading_an_entry_fetches_nothing_new() {
    let archive = common::wheel_archive(50_000);
    let temp = write_temp(&archive);
    let mut file = open(temp.path(), 1024);

    let mut zip = ZipArchive::new(&mut file).unwrap();
    let mut first = String::new();
    zip.by_name("demo-1.0.dist-info/RECORD").unwrap().read_to_string(&mut first).unwrap();
    drop(zip);
    let transferred = file.total_bytes_transferred();
    let spans = file.materialized().clone();

    let mut zip = ZipArchive::new(&mut file).unwrap();
    let mut second = String::new();
    zip.by_name("demo-1.0.dist-info/RECORD").unwrap().read_to_string(&mut second).unwrap();
    drop(zip);

    assert_eq!(first, second);
    assert_eq!(file.total_bytes_transferred(), transferred);
    assert_eq!(file.materialized(), &spans);
}

#[test]
fn wheel_metadata_from_local_archive() {
    let archive = common::wheel_archive(200_000);
    let temp = write_temp(&archive);
    let mut file = open(temp.path(), 8192);

    let mut zip = ZipArchive::new(&mut file).unwrap();
    let dist = wheel::dist_name("demo-1.0-py3-none-any.whl");
    let metadata = wheel::read_metadata(&mut zip, dist.as_deref()).unwrap();

    assert_eq!(metadata.get("Name"), Some("demo"));
    assert_eq!(
        metadata.get_all("Requires-Dist").collect::<Vec<_>>(),
        vec!["requests (>=2.0)", "click"]
    );
    assert_eq!(metadata.body().trim(), "Long description.");
}

#[test]
fn metadata_missing_is_reported() {
    let archive = {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("readme.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hello").unwrap();
        writer.finish().unwrap().into_inner()
    };
    let temp = write_temp(&archive);
    let mut file = open(temp.path(), 100);

    let mut zip = ZipArchive::new(&mut file).unwrap();
    let err = wheel::read_metadata(&mut zip, None).unwrap_err();
    assert!(matches!(err, quickread::Error::MetadataNotFound));
}

#[test]
fn close_releases_the_source() {
    let temp = write_temp(b"0123456789");
    let mut file = open(temp.path(), 4);
    assert_eq!(file.read_span(Some(4)).unwrap(), b"0123");
    file.close().unwrap();
}
