//! Output formatters for command results.
//!
//! - [`text`] for terminals (colored with yansi, sizes via bytesize)
//! - [`json`] for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use integrisync::error::ExitCode;
//! use integrisync::jobs::JobReport;
//! use integrisync::output::{text, JsonOutput};
//!
//! let report = JobReport::new("Corrupt files");
//! print!("{}", text::render_report(&report));
//! println!("{}", JsonOutput::new("verify", &report, ExitCode::Success).to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::JsonOutput;
