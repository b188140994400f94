use clap::Parser;

use crate::file::DEFAULT_MIN_FETCH_SIZE;

#[derive(Parser, Debug)]
#[command(name = "quickread")]
#[command(version)]
#[command(about = "Read files from local or remote ZIP archives, fetching only the bytes needed", long_about = None)]
#[command(after_help = "Examples:\n  \
  quickread -l https://example.com/pkg-1.0-py3-none-any.whl   list a remote wheel\n  \
  quickread --metadata https://example.com/pkg-1.0-py3-none-any.whl\n  \
  quickread -p data.zip notes.txt | more                        print one entry")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Entries to extract (default: all)
    #[arg(value_name = "ENTRIES")]
    pub entries: Vec<String>,

    /// List entries (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List entries verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Print entry contents to stdout
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract entries into DIR
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude entries that follow
    #[arg(short = 'x', value_name = "ENTRY", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files without prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Print the core metadata of a Python wheel
    #[arg(long)]
    pub metadata: bool,

    /// Smallest number of bytes fetched per request
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MIN_FETCH_SIZE)]
    pub min_fetch_size: u64,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Report how much of the archive was transferred
    #[arg(long)]
    pub stats: bool,

    /// Log every fetch to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.debug { "quickread=debug" } else { "warn" }
    }
}
