//! Summary of a finished batch job.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A file a job could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Path relative to the source root
    pub path: String,
    /// Rendered error
    pub error: String,
}

/// Outcome of `generate` or `verify`.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// "New files" or "Corrupt files"
    pub title: String,
    /// Files hashed (generate) or found corrupt (verify)
    pub paths: Vec<String>,
    /// Number of files analyzed
    pub analyzed: usize,
    /// Wall-clock duration in seconds
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// When the job finished
    pub finished_at: DateTime<Utc>,
    /// Files that failed with an I/O error
    pub failures: Vec<Failure>,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl JobReport {
    /// Start an empty report.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            paths: Vec::new(),
            analyzed: 0,
            elapsed: Duration::ZERO,
            finished_at: Utc::now(),
            failures: Vec::new(),
        }
    }

    /// Stamp the elapsed time and finish timestamp.
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
        self.finished_at = Utc::now();
    }

    /// Whether any file was listed.
    #[must_use]
    pub fn has_paths(&self) -> bool {
        !self.paths.is_empty()
    }

    /// The plain-text body: listed paths, a blank line, then the summary line.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut text = self.paths.join("\n");
        text.push_str("\n\n");
        let _ = write!(
            text,
            "Analyzed {} files in {}.",
            self.analyzed,
            natural_duration(self.elapsed)
        );
        if !self.failures.is_empty() {
            let _ = write!(text, "\n\n{} files could not be read:", self.failures.len());
            for failure in &self.failures {
                let _ = write!(text, "\n{}: {}", failure.path, failure.error);
            }
        }
        text
    }
}

/// Coarse human wording of a duration ("a moment", "3 minutes", "an hour").
#[must_use]
pub fn natural_duration(duration: Duration) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    let secs = duration.as_secs();
    match secs {
        0 => "a moment".to_string(),
        1 => "a second".to_string(),
        s if s < MINUTE => format!("{s} seconds"),
        s if s < 2 * MINUTE => "a minute".to_string(),
        s if s < HOUR => format!("{} minutes", s / MINUTE),
        s if s < 2 * HOUR => "an hour".to_string(),
        s if s < DAY => format!("{} hours", s / HOUR),
        s if s < 2 * DAY => "a day".to_string(),
        s => format!("{} days", s / DAY),
    }
}
