//! Batch jobs over the configured source directories.
//!
//! Both jobs walk every configured directory on the source side and fan the
//! per-file work out over a bounded rayon pool:
//!
//! - [`generate_new_hashes`] writes a side-car for every file that lacks one
//! - [`verify_all_hashes`] lists every file whose content no longer matches
//!
//! A shutdown flag is checked before each file; a job that saw it set returns
//! [`JobError::Interrupted`] once the in-flight files are done.

pub mod report;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::explorer::{
    clean_relative, Directory, Explorer, ExplorerError, ExplorerResult, File, Side,
};
use crate::progress::ProgressCallback;

pub use report::{natural_duration, Failure, JobReport};

/// Build a pool of `threads` workers, falling back to rayon's default size.
pub(crate) fn io_pool(threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .or_else(|e| {
            log::warn!("Failed to create {threads}-thread pool ({e}), using default size");
            rayon::ThreadPoolBuilder::new().build()
        })
}

/// Errors that abort a job.
#[derive(thiserror::Error, Debug)]
pub enum JobError {
    /// Ctrl+C was pressed while the job was running.
    #[error("Job interrupted by user")]
    Interrupted,

    /// A configured directory could not be resolved or walked.
    #[error(transparent)]
    Explorer(#[from] ExplorerError),

    /// The worker pool could not be created.
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Settings shared by both jobs.
#[derive(Clone)]
pub struct JobConfig {
    /// Directories relative to the source root; empty means the whole root.
    pub directories: Vec<PathBuf>,
    /// Worker threads.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for JobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobConfig")
            .field("directories", &self.directories)
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            io_threads: 4,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl JobConfig {
    /// Set the directories to walk.
    #[must_use]
    pub fn with_directories(mut self, directories: Vec<PathBuf>) -> Self {
        self.directories = directories;
        self
    }

    /// Set the worker thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Eligible source files under every configured directory, in walk order.
///
/// A configured directory that does not exist contributes nothing.
fn source_files(explorer: &Explorer, config: &JobConfig) -> ExplorerResult<Vec<File>> {
    let directories = if config.directories.is_empty() {
        vec![PathBuf::new()]
    } else {
        config.directories.clone()
    };

    let mut files = Vec::new();
    for directory in &directories {
        let directory = Directory::new(
            explorer.clone(),
            Side::Source,
            clean_relative(directory)?,
        );
        if !directory.full_path().is_dir() {
            log::warn!(
                "Configured directory is missing: {}",
                directory.full_path().display()
            );
            continue;
        }
        files.extend(directory.files_recursive()?);
    }
    Ok(files)
}

/// Run `work` on every file; `None` marks files skipped after a shutdown.
fn run_files<F>(
    files: Vec<File>,
    phase: &str,
    config: &JobConfig,
    work: F,
) -> Result<Vec<(File, Option<ExplorerResult<bool>>)>, JobError>
where
    F: Fn(&File) -> ExplorerResult<bool> + Sync,
{
    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(phase, files.len());
    }

    let pool = io_pool(config.io_threads)?;
    let done = AtomicUsize::new(0);
    let results = pool.install(|| {
        files
            .into_par_iter()
            .map(|file| {
                if config.is_shutdown_requested() {
                    return (file, None);
                }
                let result = work(&file);
                let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref callback) = config.progress_callback {
                    callback.on_progress(current, &file.path().to_string_lossy());
                }
                (file, Some(result))
            })
            .collect::<Vec<_>>()
    });

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(phase);
    }

    if config.is_shutdown_requested() {
        log::info!("{phase}: interrupted by shutdown signal");
        return Err(JobError::Interrupted);
    }
    Ok(results)
}

fn record_failure(report: &mut JobReport, file: &File, error: &ExplorerError) {
    log::warn!("Failed to analyze {}: {}", file.full_path().display(), error);
    report.failures.push(Failure {
        path: file.path().to_string_lossy().into_owned(),
        error: error.to_string(),
    });
}

/// Write side-cars for every eligible source file that has none.
///
/// The report lists the files that were hashed; `analyzed` counts only them.
///
/// # Errors
///
/// Returns [`JobError::Interrupted`] after a shutdown request, or
/// [`JobError::Explorer`] if a configured directory cannot be walked.
/// Per-file failures are recorded in the report instead.
pub fn generate_new_hashes(explorer: &Explorer, config: &JobConfig) -> Result<JobReport, JobError> {
    let start = Instant::now();
    let mut report = JobReport::new("New files");
    let files = source_files(explorer, config)?;
    log::info!("Generating hashes: {} candidate files", files.len());

    let results = run_files(files, "generate", config, |file| {
        if !file.clean_hash()?.is_empty() {
            return Ok(false);
        }
        log::info!("Analyzing {}", file.path().display());
        file.update_hash_file()?;
        Ok(true)
    })?;

    for (file, result) in results {
        match result {
            Some(Ok(true)) => {
                report.analyzed += 1;
                report.paths.push(file.path().to_string_lossy().into_owned());
            }
            Some(Err(e)) => record_failure(&mut report, &file, &e),
            Some(Ok(false)) | None => {}
        }
    }

    report.finish(start.elapsed());
    log::info!(
        "Generated {} hashes in {:.2}s",
        report.analyzed,
        report.elapsed.as_secs_f64()
    );
    Ok(report)
}

/// Check every eligible source file against its side-car.
///
/// The report lists the corrupt files; `analyzed` counts every file checked.
/// Files without a side-car are never corrupt.
///
/// # Errors
///
/// Same as [`generate_new_hashes`].
pub fn verify_all_hashes(explorer: &Explorer, config: &JobConfig) -> Result<JobReport, JobError> {
    let start = Instant::now();
    let mut report = JobReport::new("Corrupt files");
    let files = source_files(explorer, config)?;
    log::info!("Verifying hashes: {} files", files.len());

    let results = run_files(files, "verify", config, |file| {
        log::debug!("Analyzing {}", file.path().display());
        file.corrupt()
    })?;

    for (file, result) in results {
        match result {
            Some(Ok(corrupt)) => {
                report.analyzed += 1;
                if corrupt {
                    report.paths.push(file.path().to_string_lossy().into_owned());
                }
            }
            Some(Err(e)) => record_failure(&mut report, &file, &e),
            None => {}
        }
    }

    report.finish(start.elapsed());
    log::info!(
        "Verified {} files, {} corrupt",
        report.analyzed,
        report.paths.len()
    );
    Ok(report)
}
