//! Mirroring files from one side to the other.
//!
//! A transfer makes the file at the same relative path on the other side
//! byte-identical to the chosen side, then refreshes the target's side-car.
//! When both sides already hash the same, the sync is skipped and only the
//! side-car is rewritten.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::explorer::sync::sync_files;
use crate::explorer::{Explorer, ExplorerError, ExplorerResult, File, Item, Side, SyncStats};
use crate::jobs::{io_pool, Failure};
use crate::progress::ProgressCallback;

/// Errors that abort a transfer.
#[derive(thiserror::Error, Debug)]
pub enum TransferError {
    /// Ctrl+C was pressed during a directory transfer.
    #[error("Transfer interrupted by user")]
    Interrupted,

    /// Resolution, hashing or syncing failed.
    #[error(transparent)]
    Explorer(#[from] ExplorerError),

    /// The worker pool could not be created.
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Settings for directory transfers.
#[derive(Clone)]
pub struct TransferConfig {
    /// Worker threads for directory transfers.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for TransferConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferConfig")
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl TransferConfig {
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

/// Result of transferring one file.
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    /// Path relative to the roots
    pub path: String,
    /// Sync statistics, or `None` when the hashes already matched
    pub stats: Option<SyncStats>,
    /// Digest now stored in the target's side-car
    pub digest: String,
}

/// Result of [`transfer`].
#[derive(Debug, Clone, Serialize)]
pub struct TransferSummary {
    /// Side the content was copied from
    pub from: Side,
    /// Requested path relative to the roots
    pub path: String,
    /// Per-file outcomes, in walk order
    pub files: Vec<TransferOutcome>,
    /// Files that failed
    pub failures: Vec<Failure>,
}

impl TransferSummary {
    /// Files whose content was rewritten.
    #[must_use]
    pub fn synced(&self) -> usize {
        self.files.iter().filter(|f| f.stats.is_some()).count()
    }

    /// Files that already matched.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.files.len() - self.synced()
    }

    /// Total bytes written across all files.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.files
            .iter()
            .filter_map(|f| f.stats)
            .map(|s| s.bytes_written)
            .sum()
    }
}

/// Mirror one file from `from` onto the other side.
///
/// The target's side-car is always refreshed, even when no bytes changed.
///
/// # Errors
///
/// Returns [`ExplorerError::NotFound`] if no file exists at `relative` on
/// `from`, and propagates hashing and sync failures.
pub fn transfer_file(explorer: &Explorer, from: Side, relative: &Path) -> ExplorerResult<TransferOutcome> {
    let to = from.other();
    explorer.resolve(from, relative)?;
    let entry = explorer.lookup(relative)?;
    let src = entry
        .file(from)
        .ok_or_else(|| ExplorerError::NotFound(explorer.roots().root(from).join(relative)))?;
    let dst = entry.file(to).unwrap_or_else(|| explorer.mirror(&src));

    let guard = entry.lock_transfer();
    let stats = if src.hash()? == dst.hash()? {
        log::debug!("Already in sync: {}", src.path().display());
        None
    } else {
        let stats = sync_files(&src, &dst, explorer.chunk_size())?;
        log::info!(
            "Synced {} -> {} ({} of {} chunks rewritten)",
            src.full_path().display(),
            dst.full_path().display(),
            stats.chunks_written,
            stats.chunks_compared
        );
        Some(stats)
    };
    let digest = dst.update_hash_file()?;
    drop(guard);

    explorer.resolve(to, relative)?;
    Ok(TransferOutcome {
        path: src.path().to_string_lossy().into_owned(),
        stats,
        digest,
    })
}

/// Mirror a file, or every eligible file under a directory, from `from` onto
/// the other side.
///
/// Directory transfers fan out over `config.io_threads` workers; a failing
/// file is recorded in the summary and the rest continue.
///
/// # Errors
///
/// A single-file transfer propagates its failure. Directory transfers return
/// [`TransferError::Interrupted`] after a shutdown request, or an error if
/// the directory cannot be walked.
pub fn transfer(
    explorer: &Explorer,
    from: Side,
    relative: &Path,
    config: &TransferConfig,
) -> Result<TransferSummary, TransferError> {
    let mut summary = TransferSummary {
        from,
        path: relative.to_string_lossy().into_owned(),
        files: Vec::new(),
        failures: Vec::new(),
    };

    let files: Vec<File> = match explorer.resolve(from, relative)? {
        Item::File(_) => {
            summary.files.push(transfer_file(explorer, from, relative)?);
            return Ok(summary);
        }
        Item::Directory(directory) => directory.files_recursive()?,
    };
    log::info!(
        "Transferring {} files from {} ({})",
        files.len(),
        from,
        relative.display()
    );

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("transfer", files.len());
    }
    let pool = io_pool(config.io_threads)?;
    let done = AtomicUsize::new(0);
    let results: Vec<(PathBuf, Option<ExplorerResult<TransferOutcome>>)> = pool.install(|| {
        files
            .into_par_iter()
            .map(|file| {
                let path = file.path().to_path_buf();
                if config.is_shutdown_requested() {
                    return (path, None);
                }
                let result = transfer_file(explorer, from, &path);
                let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref callback) = config.progress_callback {
                    callback.on_progress(current, &path.to_string_lossy());
                }
                (path, Some(result))
            })
            .collect()
    });
    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("transfer");
    }

    if config.is_shutdown_requested() {
        log::info!("Transfer interrupted by shutdown signal");
        return Err(TransferError::Interrupted);
    }

    for (path, result) in results {
        match result {
            Some(Ok(outcome)) => summary.files.push(outcome),
            Some(Err(e)) => {
                log::warn!("Failed to transfer {}: {}", path.display(), e);
                summary.failures.push(Failure {
                    path: path.to_string_lossy().into_owned(),
                    error: e.to_string(),
                });
            }
            None => {}
        }
    }
    Ok(summary)
}
