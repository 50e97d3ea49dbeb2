//! Side-car digest storage.
//!
//! Each file `photo.jpg` may have a companion `photo.jpg.blake2` in the same
//! directory holding the lowercase hex BLAKE2b-512 digest recorded the last
//! time the file was known to be good. An absent side-car means the file was
//! never hashed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use blake2::{Blake2b512, Digest};

use super::{read_chunk, ExplorerError, ExplorerResult};

/// Extension appended to a file name to form its side-car name.
pub const SIDECAR_EXTENSION: &str = "blake2";

/// Bytes accounted to every existing file for its side-car (one hex digest).
pub const SIDECAR_OVERHEAD: u64 = 128;

/// Side-car path for `path`: `<file-name>.blake2` next to the file.
#[must_use]
pub fn sidecar_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    path.with_file_name(name)
}

/// Whether `path` names a side-car artifact.
#[must_use]
pub fn is_sidecar(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SIDECAR_EXTENSION))
}

/// Stream `reader` through BLAKE2b-512 in `chunk_size` reads.
///
/// # Errors
///
/// Propagates read errors.
pub fn digest_reader<R: io::Read>(reader: &mut R, chunk_size: usize) -> io::Result<String> {
    let mut hasher = Blake2b512::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    loop {
        let n = read_chunk(reader, &mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Computes and persists the digest of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashStore {
    target: PathBuf,
    sidecar: PathBuf,
    chunk_size: usize,
}

impl HashStore {
    /// Create a store for the file at `target`.
    #[must_use]
    pub fn new(target: PathBuf, chunk_size: usize) -> Self {
        let sidecar = sidecar_path_for(&target);
        Self {
            target,
            sidecar,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Path of the side-car artifact.
    #[must_use]
    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar
    }

    /// Whether a side-car exists.
    #[must_use]
    pub fn has_sidecar(&self) -> bool {
        self.sidecar.is_file()
    }

    /// Digest of the current file content, or an empty string if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Io`] on read failures other than absence.
    pub fn compute(&self) -> ExplorerResult<String> {
        if !self.target.is_file() {
            return Ok(String::new());
        }
        let mut file = match fs::File::open(&self.target) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(String::new()),
            Err(e) => return Err(ExplorerError::io(&self.target, e)),
        };
        let digest = digest_reader(&mut file, self.chunk_size)
            .map_err(|e| ExplorerError::io(&self.target, e))?;
        log::trace!("Hashed {}: {}", self.target.display(), digest);
        Ok(digest)
    }

    /// Digest persisted in the side-car, or an empty string if absent.
    ///
    /// Trailing whitespace (a newline added by an editor) is ignored. A
    /// side-car with nothing but whitespace loads as empty, like a missing one.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Io`] on read failures other than absence.
    pub fn load(&self) -> ExplorerResult<String> {
        match fs::read_to_string(&self.sidecar) {
            Ok(content) => Ok(content.trim_end().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(ExplorerError::io(&self.sidecar, e)),
        }
    }

    /// Overwrite (or create) the side-car with `digest`.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Io`] if the side-car cannot be written.
    pub fn store(&self, digest: &str) -> ExplorerResult<()> {
        fs::write(&self.sidecar, digest).map_err(|e| ExplorerError::io(&self.sidecar, e))?;
        log::debug!("Updated side-car {}", self.sidecar.display());
        Ok(())
    }

    /// Hash the file and persist the digest, returning it.
    ///
    /// # Errors
    ///
    /// Propagates hashing and write failures.
    pub fn refresh(&self) -> ExplorerResult<String> {
        let digest = self.compute()?;
        self.store(&digest)?;
        Ok(digest)
    }
}
