//! Human-readable output.
//!
//! Colors come from yansi and are switched off globally by `--no-color`,
//! `NO_COLOR` or JSON output.

use std::fmt::Write as _;

use bytesize::ByteSize;
use yansi::Paint;

use crate::actions::{Listing, PairSizes, TransferSummary};
use crate::jobs::JobReport;

/// Hex characters of a digest shown in listings.
const DIGEST_PREFIX: usize = 16;

fn short_digest(digest: &str) -> &str {
    digest.get(..DIGEST_PREFIX).unwrap_or(digest)
}

/// A directory listing with a breadcrumb header and disk usage.
#[must_use]
pub fn render_listing(listing: &Listing) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        format!("[{}]", listing.side).bold(),
        listing.parts.join("/").bold()
    );
    if listing.total_size > 0 {
        let _ = writeln!(
            out,
            "{}",
            format!(
                "{} free of {}",
                ByteSize::b(listing.free_size),
                ByteSize::b(listing.total_size)
            )
            .dim()
        );
    }
    for child in &listing.children {
        if child.directory {
            let _ = writeln!(out, "  {}/", child.name.blue().bold());
        } else if child.clean_hash.is_empty() {
            let _ = writeln!(out, "  {:<40} {}", child.name, "(no hash)".yellow());
        } else {
            let _ = writeln!(
                out,
                "  {:<40} {}",
                child.name,
                short_digest(&child.clean_hash).dim()
            );
        }
    }
    out
}

/// Both-side sizes of one path.
#[must_use]
pub fn render_sizes(path: &str, sizes: &PairSizes) -> String {
    format!(
        "{}\n  source:      {} ({} bytes)\n  destination: {} ({} bytes)\n",
        path.bold(),
        ByteSize::b(sizes.src_size),
        sizes.src_size,
        ByteSize::b(sizes.dst_size),
        sizes.dst_size
    )
}

/// Corruption flag of one path.
#[must_use]
pub fn render_check(path: &str, corrupt: bool) -> String {
    if corrupt {
        format!("{}: {}\n", path, "corrupt".red().bold())
    } else {
        format!("{}: {}\n", path, "ok".green())
    }
}

/// Digest written by `update`.
#[must_use]
pub fn render_digest(path: &str, digest: &str) -> String {
    if digest.is_empty() {
        format!("{}: {}\n", path, "directory, nothing to hash".dim())
    } else {
        format!("{digest}  {path}\n")
    }
}

/// Per-file lines and a totals line.
#[must_use]
pub fn render_transfer(summary: &TransferSummary) -> String {
    let mut out = String::new();
    for file in &summary.files {
        match file.stats {
            Some(stats) if stats.created => {
                let _ = writeln!(
                    out,
                    "{} {} ({})",
                    "created".green(),
                    file.path,
                    ByteSize::b(stats.bytes_written)
                );
            }
            Some(stats) => {
                let _ = writeln!(
                    out,
                    "{} {} ({} of {} chunks, {})",
                    "patched".cyan(),
                    file.path,
                    stats.chunks_written,
                    stats.chunks_compared,
                    ByteSize::b(stats.bytes_written)
                );
            }
            None => {
                let _ = writeln!(out, "{} {}", "unchanged".dim(), file.path);
            }
        }
    }
    for failure in &summary.failures {
        let _ = writeln!(out, "{} {}: {}", "failed".red().bold(), failure.path, failure.error);
    }
    let _ = writeln!(
        out,
        "\nTransferred {} files from {}: {} synced, {} unchanged, {} failed, {} written.",
        summary.files.len(),
        summary.from,
        summary.synced(),
        summary.skipped(),
        summary.failures.len(),
        ByteSize::b(summary.bytes_written())
    );
    out
}

/// A job report under its title.
#[must_use]
pub fn render_report(report: &JobReport) -> String {
    format!(
        "{}\n\n{}\n",
        report.title.as_str().bold(),
        report.render_text()
    )
}
