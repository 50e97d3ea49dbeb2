//! JSON output for scripting.
//!
//! Every command prints one envelope:
//!
//! ```json
//! {
//!   "command": "verify",
//!   "exit_code": 2,
//!   "exit_code_name": "IS002",
//!   "result": { "title": "Corrupt files", "paths": ["2023/a.jpg"], "analyzed": 12, ... }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::error::ExitCode;

/// Command result wrapped with its exit status.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a, T: Serialize> {
    /// Subcommand name
    pub command: &'a str,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "IS000")
    pub exit_code_name: &'static str,
    /// Command-specific payload
    pub result: &'a T,
}

impl<'a, T: Serialize> JsonOutput<'a, T> {
    /// Wrap `result` for `command`.
    #[must_use]
    pub fn new(command: &'a str, result: &'a T, exit_code: ExitCode) -> Self {
        Self {
            command,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
            result,
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)
    }
}
