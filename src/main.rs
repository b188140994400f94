//! Command-line front end for quickread.
//!
//! Opens a local or remote ZIP archive through a [`RangeFile`] and hands it to the
//! `zip` crate, so only the central directory and the selected entries are read.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use zip::ZipArchive;

use quickread::{ByteSource, Cli, HttpRangeSource, LocalFileSource, RangeFile, wheel};

type Archive<'a> = ZipArchive<&'a mut RangeFile<Box<dyn ByteSource>>>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let source: Box<dyn ByteSource> = if cli.is_http_url() {
        let timeout = std::time::Duration::from_secs(cli.timeout);
        Box::new(HttpRangeSource::with_timeout(cli.file.clone(), timeout)?)
    } else {
        let path = Path::new(&cli.file);
        Box::new(LocalFileSource::open(path).with_context(|| format!("cannot open {}", cli.file))?)
    };
    let mut file = RangeFile::new(source).with_min_fetch_size(cli.min_fetch_size);

    let outcome = process_archive(&mut file, &cli);

    if outcome.is_ok() && (cli.stats || (cli.is_http_url() && !cli.is_quiet())) {
        report_transfer(&mut file)?;
    }
    file.close()?;
    outcome
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn process_archive(file: &mut RangeFile<Box<dyn ByteSource>>, cli: &Cli) -> Result<()> {
    let mut archive = ZipArchive::new(file).context("failed to read ZIP central directory")?;

    if cli.metadata {
        return print_metadata(&mut archive, cli);
    }
    if cli.list || cli.verbose {
        return list_entries(&mut archive, cli.verbose);
    }

    let selected = select_entries(&archive, cli);
    let show_names = cli.pipe && selected.len() > 1;
    for name in &selected {
        extract_entry(&mut archive, name, cli, show_names)?;
    }
    Ok(())
}

fn print_metadata(archive: &mut Archive<'_>, cli: &Cli) -> Result<()> {
    let dist = wheel::dist_name(wheel::file_name(&cli.file));
    let metadata = wheel::read_metadata(archive, dist.as_deref())?;

    let mut stdout = io::stdout().lock();
    for (name, value) in metadata.headers() {
        writeln!(stdout, "{name}: {value}")?;
    }
    if cli.verbose && !metadata.body().is_empty() {
        writeln!(stdout, "\n{}", metadata.body())?;
    }
    Ok(())
}

/// Short listing needs only the central directory. The verbose one opens every
/// entry, which also reads its local header.
fn list_entries(archive: &mut Archive<'_>, verbose: bool) -> Result<()> {
    if !verbose {
        for name in archive.file_names() {
            println!("{name}");
        }
        return Ok(());
    }

    println!("{:>10}  {:>10}  {:>5}  Name", "Length", "Size", "Cmpr");
    println!("{}", "-".repeat(50));

    let (mut total_size, mut total_compressed, mut count) = (0u64, 0u64, 0usize);
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        println!(
            "{:>10}  {:>10}  {}  {}",
            entry.size(),
            entry.compressed_size(),
            saving(entry.compressed_size(), entry.size()),
            entry.name()
        );
        if !entry.is_dir() {
            total_size += entry.size();
            total_compressed += entry.compressed_size();
            count += 1;
        }
    }

    println!("{}", "-".repeat(50));
    println!(
        "{:>10}  {:>10}  {}  {} files",
        total_size,
        total_compressed,
        saving(total_compressed, total_size),
        count
    );
    Ok(())
}

fn saving(compressed: u64, size: u64) -> String {
    if size == 0 {
        return "   0%".to_string();
    }
    let saved = 100 - (compressed.min(size) * 100 / size);
    format!("{saved:>4}%")
}

/// Entry names to extract: not directories, matching the requested names (if any)
/// and none of the exclusions.
fn select_entries(archive: &Archive<'_>, cli: &Cli) -> Vec<String> {
    archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .filter(|name| cli.entries.is_empty() || cli.entries.iter().any(|want| entry_matches(want, name)))
        .filter(|name| !cli.exclude.iter().any(|x| name.contains(x.as_str()) || glob_match(x, name)))
        .map(str::to_string)
        .collect()
}

/// Globs match the whole entry name; plain names match the full path or the base name.
fn entry_matches(pattern: &str, name: &str) -> bool {
    if pattern.contains(['*', '?']) {
        return glob_match(pattern, name);
    }
    name == pattern || base_name(name) == pattern
}

fn base_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// `*` matches any run of characters, `?` exactly one.
fn glob_match(pattern: &str, text: &str) -> bool {
    fn matches(pattern: &[char], text: &[char]) -> bool {
        match (pattern.split_first(), text.split_first()) {
            (None, _) => text.is_empty(),
            (Some(('*', rest)), _) => {
                matches(rest, text) || (!text.is_empty() && matches(pattern, &text[1..]))
            }
            (Some(('?', rest)), Some((_, tail))) => matches(rest, tail),
            (Some((p, rest)), Some((t, tail))) => p == t && matches(rest, tail),
            (Some(_), None) => false,
        }
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    matches(&pattern, &text)
}

fn extract_entry(archive: &mut Archive<'_>, name: &str, cli: &Cli, show_name: bool) -> Result<()> {
    let mut entry = archive.by_name(name)?;

    if cli.pipe {
        let mut stdout = io::stdout().lock();
        if show_name {
            writeln!(stdout, "--- {name} ---")?;
        }
        io::copy(&mut entry, &mut stdout)?;
        return Ok(());
    }

    let Some(relative) = entry.enclosed_name() else {
        if !cli.is_quiet() {
            eprintln!("Skipping: {name} (unsafe path)");
        }
        return Ok(());
    };
    let relative = if cli.junk_paths {
        PathBuf::from(base_name(name))
    } else {
        relative
    };
    let output = match &cli.extract_dir {
        Some(dir) => Path::new(dir).join(relative),
        None => relative,
    };

    if output.exists() && (cli.never_overwrite || !cli.overwrite) {
        if !cli.is_quiet() {
            let hint = if cli.never_overwrite { "file exists" } else { "use -o to overwrite" };
            eprintln!("Skipping: {name} ({hint})");
        }
        return Ok(());
    }

    if !cli.is_quiet() {
        println!("  extracting: {name}");
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut out = fs::File::create(&output).with_context(|| format!("cannot create {}", output.display()))?;
    io::copy(&mut entry, &mut out)?;
    Ok(())
}

fn report_transfer(file: &mut RangeFile<Box<dyn ByteSource>>) -> Result<()> {
    let transferred = file.total_bytes_transferred();
    let size = file.total_size()?;
    let ratio = file.transferred_ratio()?;
    eprintln!(
        "\nTotal bytes transferred: {} of {} ({:.2}%)",
        format_size(transferred),
        format_size(size),
        ratio * 100.0
    );
    Ok(())
}

fn format_size(size: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if size < 1024 {
        return format!("{size} bytes");
    }
    let mut value = size as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("*.txt", "readme.txt"));
        assert!(glob_match("file?.dat", "file1.dat"));
        assert!(glob_match("*.dist-info/*", "pkg-1.0.dist-info/METADATA"));
        assert!(!glob_match("*.txt", "readme.md"));
        assert!(!glob_match("file?.dat", "file.dat"));
    }

    #[test]
    fn test_entry_matches() {
        assert!(entry_matches("METADATA", "pkg-1.0.dist-info/METADATA"));
        assert!(entry_matches("pkg-1.0.dist-info/METADATA", "pkg-1.0.dist-info/METADATA"));
        assert!(entry_matches("*.py", "pkg/__init__.py"));
        assert!(!entry_matches("RECORD", "pkg-1.0.dist-info/METADATA"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_saving() {
        assert_eq!(saving(25, 100), "  75%");
        assert_eq!(saving(0, 0), "   0%");
        assert_eq!(saving(120, 100), "   0%");
    }
}
