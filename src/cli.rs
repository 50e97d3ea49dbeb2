//! Command-line interface definitions for integrisync.
//!
//! Global options select the roots, chunk size, verbosity and output format;
//! each subcommand maps to one action or batch job.
//!
//! # Example
//!
//! ```bash
//! # List the top of the source tree
//! integrisync --src-root /srv/photos --dst-root /mnt/backup browse
//!
//! # Mirror a directory onto the destination
//! integrisync transfer 2024/summer
//!
//! # Nightly jobs
//! integrisync generate --report new.txt
//! integrisync -o json verify
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::explorer::Side;

/// File integrity checker and chunked mirror.
///
/// integrisync keeps a BLAKE2b side-car digest next to every file, detects
/// silent corruption, and mirrors a source tree onto a destination by
/// rewriting only the chunks that differ.
#[derive(Debug, Parser)]
#[command(name = "integrisync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (default: platform config dir)
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Root of the authoritative tree
    #[arg(long, value_name = "PATH", global = true)]
    pub src_root: Option<PathBuf>,

    /// Root of the mirror tree
    #[arg(long, value_name = "PATH", global = true)]
    pub dst_root: Option<PathBuf>,

    /// Read size for hashing and sync (e.g., 64KiB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size, global = true)]
    pub chunk_size: Option<u64>,

    /// Worker threads for batch jobs and directory transfers
    #[arg(long, value_name = "N", global = true)]
    pub io_threads: Option<usize>,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List a directory with side-car digests and disk usage
    Browse(BrowseArgs),
    /// Size of a directory on both sides
    DirSize(PathArgs),
    /// Size of a paired file on both sides
    FileSize(PathArgs),
    /// Mirror a file or directory onto the other side
    Transfer(SideArgs),
    /// Check a file against its side-car
    Check(SideArgs),
    /// Rewrite a file's side-car from its current content
    Update(SideArgs),
    /// Hash every configured source file that has no side-car yet
    Generate(JobArgs),
    /// Check every configured source file against its side-car
    Verify(JobArgs),
    /// Print the effective configuration
    Config,
}

impl Commands {
    /// Subcommand name as typed on the command line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Browse(_) => "browse",
            Self::DirSize(_) => "dir-size",
            Self::FileSize(_) => "file-size",
            Self::Transfer(_) => "transfer",
            Self::Check(_) => "check",
            Self::Update(_) => "update",
            Self::Generate(_) => "generate",
            Self::Verify(_) => "verify",
            Self::Config => "config",
        }
    }
}

/// Arguments for the browse subcommand.
#[derive(Debug, Args)]
pub struct BrowseArgs {
    /// Directory relative to the root (default: the root itself)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// List the destination side instead of the source
    #[arg(long)]
    pub dst: bool,
}

impl BrowseArgs {
    /// Listed directory, the root when omitted.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.path.clone().unwrap_or_default()
    }

    /// Side selected by `--dst`.
    #[must_use]
    pub fn side(&self) -> Side {
        side_from_flag(self.dst)
    }
}

/// A path relative to both roots.
#[derive(Debug, Args)]
pub struct PathArgs {
    /// Path relative to the roots
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

/// A path on one side.
#[derive(Debug, Args)]
pub struct SideArgs {
    /// Path relative to the root
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Operate on the destination side (for transfer: copy destination to source)
    #[arg(long)]
    pub dst: bool,
}

impl SideArgs {
    /// Side selected by `--dst`.
    #[must_use]
    pub fn side(&self) -> Side {
        side_from_flag(self.dst)
    }
}

/// Arguments for batch jobs.
#[derive(Debug, Args)]
pub struct JobArgs {
    /// Also write the report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

fn side_from_flag(dst: bool) -> Side {
    if dst {
        Side::Destination
    } else {
        Side::Source
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use integrisync::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("64KiB").unwrap(), 65_536);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
