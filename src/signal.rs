//! Ctrl+C handling for batch jobs.
//!
//! Hashing or syncing one file always runs to completion. Jobs and directory
//! transfers poll the shared flag between files and return an `Interrupted`
//! error, which `main` turns into [`EXIT_CODE_INTERRUPTED`].
//!
//! ```rust,no_run
//! use integrisync::jobs::JobConfig;
//! use integrisync::signal::shutdown_flag;
//!
//! let flag = shutdown_flag().expect("Ctrl+C hook");
//! let config = JobConfig::default().with_shutdown_flag(flag);
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (128 + 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The Ctrl+C hook could not be registered.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

fn on_interrupt(flag: &AtomicBool) {
    flag.store(true, Ordering::SeqCst);
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\nInterrupted. Finishing the current file...");
    let _ = stderr.flush();
    log::info!("Shutdown signal received");
}

/// Process-wide shutdown flag, cleared for the caller.
///
/// The Ctrl+C hook is registered on first use. Later calls (several
/// `run_app` invocations in one test binary) get the same flag back. When
/// another hook already owns the signal, the flag is still returned so that
/// it can be set programmatically.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if registering the hook fails for
/// a reason other than an existing handler.
pub fn shutdown_flag() -> Result<Arc<AtomicBool>, SignalError> {
    let mut registered = Ok(());
    let flag = FLAG.get_or_init(|| {
        let flag = Arc::new(AtomicBool::new(false));
        let hooked = Arc::clone(&flag);
        registered = ctrlc::set_handler(move || on_interrupt(&hooked));
        flag
    });

    match registered {
        Ok(()) | Err(ctrlc::Error::MultipleHandlers) => {}
        Err(e) => return Err(e.into()),
    }

    flag.store(false, Ordering::SeqCst);
    Ok(Arc::clone(flag))
}
