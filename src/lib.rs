//! integrisync - file integrity checker and chunked mirror
//!
//! Keeps a BLAKE2b-512 side-car digest (`<name>.blake2`) next to every file
//! in a source tree, detects silent corruption, and mirrors files onto a
//! destination tree by rewriting only the chunks that differ.

pub mod actions;
pub mod cli;
pub mod config;
pub mod error;
pub mod explorer;
pub mod jobs;
pub mod logging;
pub mod output;
pub mod progress;
pub mod signal;

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use crate::actions::TransferConfig;
use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::{Config, ConfigOverrides};
use crate::error::ExitCode;
use crate::jobs::{JobConfig, JobReport};
use crate::output::{text, JsonOutput};
use crate::progress::{Progress, ProgressCallback};

/// Run the CLI, printing results to stdout.
///
/// # Errors
///
/// Returns an error if configuration, resolution, or I/O fails.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_writer(cli, &mut out)
}

/// Run the CLI, printing results to `out`.
///
/// # Errors
///
/// Returns an error if configuration, resolution, or I/O fails.
pub fn run_with_writer<W: Write>(cli: Cli, out: &mut W) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color || cli.output == OutputFormat::Json {
        yansi::disable();
    }

    let overrides = ConfigOverrides {
        src_root: cli.src_root.clone(),
        dst_root: cli.dst_root.clone(),
        chunk_size: cli
            .chunk_size
            .map(usize::try_from)
            .transpose()
            .context("Chunk size does not fit in memory")?,
        io_threads: cli.io_threads,
    };
    let config = Config::load(cli.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;

    let command = cli.command.name();
    let printer = Printer {
        format: cli.output,
        command,
    };

    if let Commands::Config = cli.command {
        match cli.output {
            OutputFormat::Text => {
                let toml = config.to_toml().context("Failed to render configuration")?;
                write!(out, "{toml}")?;
            }
            OutputFormat::Json => printer.json(out, &config, ExitCode::Success)?,
        }
        return Ok(ExitCode::Success);
    }

    let explorer = config.explorer().context("Incomplete configuration")?;
    log::debug!(
        "Roots: source={} destination={}",
        explorer.roots().root(explorer::Side::Source).display(),
        explorer.roots().root(explorer::Side::Destination).display()
    );
    let show_progress = !cli.quiet && cli.output == OutputFormat::Text;

    match cli.command {
        Commands::Browse(args) => {
            let path = args.path();
            let listing = actions::browse(&explorer, args.side(), &path)
                .with_context(|| format!("Failed to list {}", display(&path)))?;
            printer.emit(out, &listing, ExitCode::Success, || text::render_listing(&listing))
        }
        Commands::DirSize(args) => {
            let sizes = actions::dir_sizes(&explorer, &args.path)
                .with_context(|| format!("Failed to size {}", args.path.display()))?;
            printer.emit(out, &sizes, ExitCode::Success, || {
                text::render_sizes(&display(&args.path), &sizes)
            })
        }
        Commands::FileSize(args) => {
            let sizes = actions::file_sizes(&explorer, &args.path)
                .with_context(|| format!("Failed to size {}", args.path.display()))?;
            printer.emit(out, &sizes, ExitCode::Success, || {
                text::render_sizes(&display(&args.path), &sizes)
            })
        }
        Commands::Transfer(args) => {
            let mut transfer_config = TransferConfig::default()
                .with_io_threads(config.io_threads)
                .with_shutdown_flag(signal::shutdown_flag()?);
            if show_progress {
                transfer_config = transfer_config.with_progress_callback(progress_bar());
            }
            let summary = actions::transfer(&explorer, args.side(), &args.path, &transfer_config)
                .with_context(|| format!("Failed to transfer {}", args.path.display()))?;
            let code = if summary.failures.is_empty() {
                ExitCode::Success
            } else {
                ExitCode::GeneralError
            };
            printer.emit(out, &summary, code, || text::render_transfer(&summary))
        }
        Commands::Check(args) => {
            let corrupt = actions::check_integrity(&explorer, args.side(), &args.path)
                .with_context(|| format!("Failed to check {}", args.path.display()))?;
            let code = if corrupt {
                ExitCode::CorruptFound
            } else {
                ExitCode::Success
            };
            printer.emit(out, &corrupt, code, || {
                text::render_check(&display(&args.path), corrupt)
            })
        }
        Commands::Update(args) => {
            let digest = actions::update_hash(&explorer, args.side(), &args.path)
                .with_context(|| format!("Failed to hash {}", args.path.display()))?;
            printer.emit(out, &digest, ExitCode::Success, || {
                text::render_digest(&display(&args.path), &digest)
            })
        }
        Commands::Generate(args) => {
            let job_config = job_config(&config, show_progress)?;
            let report = jobs::generate_new_hashes(&explorer, &job_config)?;
            let code = job_exit_code(&report, false);
            printer.report(out, &report, code, args.report.as_deref())
        }
        Commands::Verify(args) => {
            let job_config = job_config(&config, show_progress)?;
            let report = jobs::verify_all_hashes(&explorer, &job_config)?;
            let code = job_exit_code(&report, true);
            printer.report(out, &report, code, args.report.as_deref())
        }
        Commands::Config => Ok(ExitCode::Success),
    }
}

fn display(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        "~".to_string()
    } else {
        path.display().to_string()
    }
}

fn progress_bar() -> Arc<dyn ProgressCallback> {
    Arc::new(Progress::new(false))
}

fn job_config(config: &Config, show_progress: bool) -> anyhow::Result<JobConfig> {
    let mut job_config = JobConfig::default()
        .with_directories(config.directories.clone())
        .with_io_threads(config.io_threads)
        .with_shutdown_flag(signal::shutdown_flag()?);
    if show_progress {
        job_config = job_config.with_progress_callback(progress_bar());
    }
    Ok(job_config)
}

/// Corruption outranks read failures; `generate` never reports corruption.
fn job_exit_code(report: &JobReport, verifying: bool) -> ExitCode {
    if verifying && report.has_paths() {
        ExitCode::CorruptFound
    } else if !report.failures.is_empty() {
        ExitCode::GeneralError
    } else {
        ExitCode::Success
    }
}

struct Printer {
    format: OutputFormat,
    command: &'static str,
}

impl Printer {
    fn json<W: Write, T: Serialize>(&self, out: &mut W, result: &T, code: ExitCode) -> anyhow::Result<()> {
        JsonOutput::new(self.command, result, code)
            .write_to(out)
            .context("Failed to write JSON output")
    }

    fn emit<W: Write, T: Serialize>(
        &self,
        out: &mut W,
        result: &T,
        code: ExitCode,
        render: impl FnOnce() -> String,
    ) -> anyhow::Result<ExitCode> {
        match self.format {
            OutputFormat::Text => write!(out, "{}", render()).context("Failed to write output")?,
            OutputFormat::Json => self.json(out, result, code)?,
        }
        Ok(code)
    }

    fn report<W: Write>(
        &self,
        out: &mut W,
        report: &JobReport,
        code: ExitCode,
        file: Option<&Path>,
    ) -> anyhow::Result<ExitCode> {
        if let Some(path) = file {
            let body = match self.format {
                OutputFormat::Text => format!("{}\n", report.render_text()),
                OutputFormat::Json => JsonOutput::new(self.command, report, code).to_json_pretty()?,
            };
            fs::write(path, body)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            log::info!("Report written to {}", path.display());
        }
        self.emit(out, report, code, || text::render_report(report))
    }
}
