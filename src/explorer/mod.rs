//! Source/destination explorer: items, side-car digests, pairing and sync.
//!
//! # Overview
//!
//! Two configured roots, the *source* and the *destination*, hold trees that
//! mirror each other at the same relative paths. The [`Explorer`] resolves a
//! `(side, relative path)` pair into an [`Item`]:
//!
//! - [`Directory`]: aggregates the sizes of its eligible files
//! - [`File`]: hashes its content with BLAKE2b-512 and compares it against the
//!   digest persisted in its side-car (see [`hash_store`])
//!
//! Every resolved file is recorded in the [`PairRegistry`], which links the
//! source-side and destination-side handles of one relative path. The
//! [`sync`] module rewrites only the destination chunks that differ from the
//! source.
//!
//! # Example
//!
//! ```no_run
//! use integrisync::explorer::{Eligibility, Explorer, Roots, Side};
//!
//! let roots = Roots::new("/srv/photos", "/mnt/backup/photos");
//! let explorer = Explorer::new(roots, Eligibility::default(), 1024 * 1024);
//!
//! let item = explorer.resolve(Side::Source, "2024/beach.jpg").unwrap();
//! if let Some(src) = item.as_file() {
//!     let dst = explorer.mirror(src);
//!     explorer.sync(src, &dst).unwrap();
//!     dst.update_hash_file().unwrap();
//! }
//! ```

pub mod eligibility;
pub mod hash_store;
pub mod item;
pub mod registry;
pub mod sync;

use std::fmt;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

pub use eligibility::Eligibility;
pub use hash_store::{HashStore, SIDECAR_EXTENSION, SIDECAR_OVERHEAD};
pub use item::{Directory, File, Item};
pub use registry::{PairEntry, PairRegistry};
pub use sync::SyncStats;

/// Default read size for hashing and sync (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Which of the two configured trees an item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The authoritative tree.
    Source,
    /// The mirror kept in sync with the source.
    Destination,
}

impl Side {
    /// The side holding this side's mirror.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Source => Self::Destination,
            Self::Destination => Self::Source,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Destination => write!(f, "destination"),
        }
    }
}

/// The pair of configured root directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    source: PathBuf,
    destination: PathBuf,
}

impl Roots {
    /// Create a root pair.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Root directory of `side`.
    #[must_use]
    pub fn root(&self, side: Side) -> &Path {
        match side {
            Side::Source => &self.source,
            Side::Destination => &self.destination,
        }
    }

    /// Map a root path back to its side.
    ///
    /// When both roots are the same path the source side wins.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::InvalidRoot`] if `root` is neither configured root.
    pub fn side_of(&self, root: &Path) -> ExplorerResult<Side> {
        if root == self.source {
            Ok(Side::Source)
        } else if root == self.destination {
            Ok(Side::Destination)
        } else {
            Err(ExplorerError::InvalidRoot(root.to_path_buf()))
        }
    }
}

/// Errors raised by the explorer core.
///
/// Missing files and side-cars are not errors: they surface as empty digests
/// and zero sizes. Corruption is reported as a flag, never as an error.
#[derive(thiserror::Error, Debug)]
pub enum ExplorerError {
    /// A root that is neither the configured source nor destination.
    #[error("Not a configured root: {0}")]
    InvalidRoot(PathBuf),

    /// No pair entry has been created for this relative path.
    #[error("Path has not been resolved: {0}")]
    NotFound(PathBuf),

    /// A relative path that is absolute or climbs out of its root.
    #[error("Path escapes its root: {0}")]
    PathEscapesRoot(PathBuf),

    /// An I/O error occurred while reading or writing.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Directory traversal failed.
    #[error("Failed to walk {path}: {source}")]
    Walk {
        /// Directory being walked
        path: PathBuf,
        /// The underlying walk error
        #[source]
        source: walkdir::Error,
    },
}

impl ExplorerError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result alias for explorer operations.
pub type ExplorerResult<T> = Result<T, ExplorerError>;

/// Strip `.` components from a path relative to a root.
///
/// Every remaining component keeps its exact spelling, so the result can be
/// joined onto a root to reach the entry on disk.
///
/// # Errors
///
/// Returns [`ExplorerError::PathEscapesRoot`] for absolute paths and `..`.
pub fn clean_relative(path: &Path) -> ExplorerResult<PathBuf> {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => cleaned.push(part),
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExplorerError::PathEscapesRoot(path.to_path_buf()));
            }
        }
    }
    Ok(cleaned)
}

/// NFC form of a clean relative path. Only used as a registry key.
pub(crate) fn registry_key(path: &Path) -> PathBuf {
    path.iter()
        .map(|part| match part.to_str() {
            Some(s) => PathBuf::from(s.nfc().collect::<String>()),
            None => PathBuf::from(part),
        })
        .collect()
}

/// Registry key of a path relative to a root.
///
/// Drops `.` components and NFC-normalizes each component so that
/// decomposed and composed spellings share one registry key. The key is not
/// a disk path: file names are opaque bytes on most filesystems.
///
/// # Errors
///
/// Returns [`ExplorerError::PathEscapesRoot`] for absolute paths and `..`.
///
/// # Example
///
/// ```
/// use integrisync::explorer::normalize_relative;
/// use std::path::{Path, PathBuf};
///
/// let path = normalize_relative(Path::new("./a/./b.txt")).unwrap();
/// assert_eq!(path, PathBuf::from("a/b.txt"));
/// assert!(normalize_relative(Path::new("../etc/passwd")).is_err());
/// ```
pub fn normalize_relative(path: &Path) -> ExplorerResult<PathBuf> {
    clean_relative(path).map(|cleaned| registry_key(&cleaned))
}

/// Fill `buf` from `reader`, stopping early only at end of input.
///
/// Returns the number of bytes read; 0 means the reader is exhausted.
pub(crate) fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Resolves paths into items and synchronizes paired files.
///
/// Cloning is cheap: the roots, filter and registry are shared.
#[derive(Debug, Clone)]
pub struct Explorer {
    roots: Arc<Roots>,
    eligibility: Arc<Eligibility>,
    registry: Arc<PairRegistry>,
    chunk_size: usize,
}

impl Explorer {
    /// Create an explorer with a fresh registry.
    ///
    /// A `chunk_size` of zero is raised to one byte.
    #[must_use]
    pub fn new(roots: Roots, eligibility: Eligibility, chunk_size: usize) -> Self {
        Self {
            roots: Arc::new(roots),
            eligibility: Arc::new(eligibility),
            registry: Arc::new(PairRegistry::new()),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Share an existing registry instead of the fresh one.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<PairRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// The configured roots.
    #[must_use]
    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    /// The eligibility filter used for listings and traversals.
    #[must_use]
    pub fn eligibility(&self) -> &Eligibility {
        &self.eligibility
    }

    /// The pair registry populated by [`Explorer::resolve`].
    #[must_use]
    pub fn registry(&self) -> &Arc<PairRegistry> {
        &self.registry
    }

    /// Read size used for hashing and sync.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Resolve a path relative to `side`'s root.
    ///
    /// Directories are returned without touching the registry. Anything else
    /// is treated as a file: its pair entry is created if needed, and the
    /// handle for `side` is created if absent or stale.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::PathEscapesRoot`] for paths outside the root.
    pub fn resolve(&self, side: Side, relative: impl AsRef<Path>) -> ExplorerResult<Item> {
        let path = clean_relative(relative.as_ref())?;
        let root = self.roots.root(side);

        if path.as_os_str().is_empty() || root.join(&path).is_dir() {
            return Ok(Item::Directory(Directory::new(self.clone(), side, path)));
        }

        let entry = self.registry.entry(&registry_key(&path));
        let file = entry.file_or_insert_with(side, || {
            log::trace!("Registering {} file: {}", side, path.display());
            File::new(side, root, path.clone(), self.chunk_size)
        });
        Ok(Item::File(file))
    }

    /// Resolve a path relative to an explicit root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::InvalidRoot`] if `root` is not one of the
    /// configured roots.
    pub fn resolve_at(&self, root: &Path, relative: impl AsRef<Path>) -> ExplorerResult<Item> {
        let side = self.roots.side_of(root)?;
        self.resolve(side, relative)
    }

    /// Pair entry of a previously resolved file path.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::NotFound`] if the path was never resolved.
    pub fn lookup(&self, relative: impl AsRef<Path>) -> ExplorerResult<Arc<PairEntry>> {
        let path = normalize_relative(relative.as_ref())?;
        self.registry.lookup(&path)
    }

    /// The file at the same relative path on the other side.
    ///
    /// The mirror is not registered; it may not exist on disk yet.
    #[must_use]
    pub fn mirror(&self, file: &File) -> File {
        let side = file.side().other();
        File::new(
            side,
            self.roots.root(side),
            file.path().to_path_buf(),
            self.chunk_size,
        )
    }

    /// Make `dst` byte-identical to `src`, rewriting only differing chunks.
    ///
    /// Syncs targeting the same relative path are serialized. This does not
    /// count as resolving the path: no pair entry is created. Side-cars are
    /// left untouched; call [`File::update_hash_file`] on `dst` afterwards.
    ///
    /// # Errors
    ///
    /// Propagates any I/O failure. The destination content is unspecified
    /// after a failed sync and the call should be repeated.
    pub fn sync(&self, src: &File, dst: &File) -> ExplorerResult<SyncStats> {
        let lock = self.registry.transfer_lock(&registry_key(dst.path()));
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        sync::sync_files(src, dst, self.chunk_size)
    }
}
