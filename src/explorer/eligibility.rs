//! Which filesystem entries are listed and traversed.
//!
//! An entry is eligible if its name does not start with `.`. Files must also
//! carry an allowed extension and must not be side-cars. At the top level of
//! a root, deny-listed names are dropped and, when configured, only the
//! listed root directories are shown.

use std::ffi::OsStr;
use std::path::Path;

use super::hash_store::is_sidecar;

/// Eligibility filter for listings and recursive traversals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eligibility {
    /// Lowercase extensions without the leading dot. Empty allows all.
    extensions: Vec<String>,
    /// Names excluded at the top level of a root.
    blacklist: Vec<String>,
    /// Directories shown at the top level of a root. Empty shows all.
    root_directories: Vec<String>,
}

impl Eligibility {
    /// Build a filter.
    ///
    /// Extensions are matched case-insensitively and may be given with or
    /// without a leading dot (`".jpg"` and `"JPG"` are equivalent).
    #[must_use]
    pub fn new(extensions: Vec<String>, blacklist: Vec<String>, root_directories: Vec<String>) -> Self {
        let extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            extensions,
            blacklist,
            root_directories,
        }
    }

    /// Restrict files to the given extensions.
    #[must_use]
    pub fn with_extensions<I, S>(self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            extensions.into_iter().map(Into::into).collect(),
            self.blacklist,
            self.root_directories,
        )
    }

    /// Names hidden from the top level of a root.
    #[must_use]
    pub fn with_blacklist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = names.into_iter().map(Into::into).collect();
        self
    }

    /// Directories shown at the top level of a root.
    #[must_use]
    pub fn with_root_directories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root_directories = names.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `name` marks a hidden entry.
    #[must_use]
    pub fn is_hidden(name: &OsStr) -> bool {
        name.to_string_lossy().starts_with('.')
    }

    /// Whether the file extension of `path` is allowed.
    #[must_use]
    pub fn allows_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.extensions.iter().any(|e| *e == extension)
    }

    /// Whether a file at `path` is eligible anywhere below the top level.
    #[must_use]
    pub fn allows_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        !Self::is_hidden(name) && !is_sidecar(path) && self.allows_extension(path)
    }

    /// Whether a directory named `name` is eligible below the top level.
    #[must_use]
    pub fn allows_dir(&self, name: &OsStr) -> bool {
        !Self::is_hidden(name)
    }

    /// Top-level rule applied to direct children of a root.
    #[must_use]
    pub fn allows_top_level(&self, name: &OsStr, is_dir: bool) -> bool {
        let name = name.to_string_lossy();
        if self.blacklist.iter().any(|b| *b == name) {
            return false;
        }
        if self.root_directories.is_empty() {
            return true;
        }
        is_dir && self.root_directories.iter().any(|d| *d == name)
    }

    /// Full rule for an entry `depth` levels below a root (1 = direct child).
    #[must_use]
    pub fn admits(&self, path: &Path, is_dir: bool, depth: usize) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        if depth == 1 && !self.allows_top_level(name, is_dir) {
            return false;
        }
        if is_dir {
            self.allows_dir(name)
        } else {
            self.allows_file(path)
        }
    }
}
