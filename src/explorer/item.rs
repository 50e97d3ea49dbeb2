//! Directory and file items.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::hash_store::{HashStore, SIDECAR_OVERHEAD};
use super::{Explorer, ExplorerError, ExplorerResult, Side};

/// A resolved filesystem entry on one side.
#[derive(Debug, Clone)]
pub enum Item {
    /// A directory; aggregates its eligible files.
    Directory(Directory),
    /// A regular file (or a path that is not a directory).
    File(File),
}

impl Item {
    /// Side this item belongs to.
    #[must_use]
    pub fn side(&self) -> Side {
        match self {
            Item::Directory(d) => d.side(),
            Item::File(f) => f.side(),
        }
    }

    /// Path relative to the side's root.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Item::Directory(d) => d.path(),
            Item::File(f) => f.path(),
        }
    }

    /// Absolute (root-joined) path.
    #[must_use]
    pub fn full_path(&self) -> &Path {
        match self {
            Item::Directory(d) => d.full_path(),
            Item::File(f) => f.full_path(),
        }
    }

    /// Final path component, `.` for a root.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Item::Directory(d) => d.name(),
            Item::File(f) => f.name(),
        }
    }

    /// Whether this is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, Item::Directory(_))
    }

    /// The file, if this item is one.
    #[must_use]
    pub fn as_file(&self) -> Option<&File> {
        match self {
            Item::File(f) => Some(f),
            Item::Directory(_) => None,
        }
    }

    /// Consume into the file, if this item is one.
    #[must_use]
    pub fn into_file(self) -> Option<File> {
        match self {
            Item::File(f) => Some(f),
            Item::Directory(_) => None,
        }
    }

    /// Size in bytes. See [`Directory::size`] and [`File::size`].
    ///
    /// # Errors
    ///
    /// Propagates I/O and traversal failures.
    pub fn size(&self) -> ExplorerResult<u64> {
        match self {
            Item::Directory(d) => d.size(),
            Item::File(f) => f.size(),
        }
    }

    /// Current digest; empty for directories and missing files.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures.
    pub fn hash(&self) -> ExplorerResult<String> {
        match self {
            Item::Directory(_) => Ok(String::new()),
            Item::File(f) => f.hash(),
        }
    }

    /// Persisted digest; empty for directories and unhashed files.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures.
    pub fn clean_hash(&self) -> ExplorerResult<String> {
        match self {
            Item::Directory(_) => Ok(String::new()),
            Item::File(f) => f.clean_hash(),
        }
    }

    /// Whether the persisted digest disagrees with the content.
    /// Directories are never corrupt.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures.
    pub fn corrupt(&self) -> ExplorerResult<bool> {
        match self {
            Item::Directory(_) => Ok(false),
            Item::File(f) => f.corrupt(),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| ".".to_string(), |n| n.to_string_lossy().into_owned())
}

/// A directory under one of the roots.
#[derive(Debug, Clone)]
pub struct Directory {
    explorer: Explorer,
    side: Side,
    path: PathBuf,
    full_path: PathBuf,
}

impl Directory {
    pub(crate) fn new(explorer: Explorer, side: Side, path: PathBuf) -> Self {
        let full_path = explorer.roots().root(side).join(&path);
        Self {
            explorer,
            side,
            path,
            full_path,
        }
    }

    /// Side this directory belongs to.
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Path relative to the root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path.
    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Final path component, `.` for the root itself.
    #[must_use]
    pub fn name(&self) -> String {
        display_name(&self.path)
    }

    /// Whether this directory is a root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    /// Sum of the sizes of all eligible files below this directory.
    ///
    /// # Errors
    ///
    /// Propagates I/O and traversal failures.
    pub fn size(&self) -> ExplorerResult<u64> {
        self.files_recursive()?
            .iter()
            .try_fold(0u64, |total, file| -> ExplorerResult<u64> {
                Ok(total + file.size()?)
            })
    }

    /// Every eligible file below this directory, sorted by name within each
    /// directory. Each file is resolved, so its pair entry exists afterwards.
    ///
    /// A directory that does not exist on disk has no files.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Walk`] if a subdirectory cannot be read.
    pub fn files_recursive(&self) -> ExplorerResult<Vec<File>> {
        if !self.full_path.is_dir() {
            return Ok(Vec::new());
        }

        let root = self.explorer.roots().root(self.side).to_path_buf();
        let eligibility = self.explorer.eligibility().clone();
        let base_depth = self.path.components().count();

        let walker = WalkDir::new(&self.full_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || eligibility.admits(
                        entry.path(),
                        entry.file_type().is_dir(),
                        base_depth + entry.depth(),
                    )
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|source| ExplorerError::Walk {
                path: self.full_path.clone(),
                source,
            })?;
            // symlinked files count, as they do in `children`
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&root)
                .map_err(|_| ExplorerError::PathEscapesRoot(entry.path().to_path_buf()))?;
            if let Item::File(file) = self.explorer.resolve(self.side, relative)? {
                files.push(file);
            }
        }
        log::debug!(
            "Found {} eligible files under {}",
            files.len(),
            self.full_path.display()
        );
        Ok(files)
    }

    /// Eligible direct children: directories first, then files, each group
    /// sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Io`] if the directory cannot be read.
    pub fn children(&self) -> ExplorerResult<Vec<Item>> {
        let read_dir =
            fs::read_dir(&self.full_path).map_err(|e| ExplorerError::io(&self.full_path, e))?;
        let depth = self.path.components().count() + 1;

        let mut children = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| ExplorerError::io(&self.full_path, e))?;
            let path = entry.path();
            let is_dir = path.is_dir();
            if !self.explorer.eligibility().admits(&path, is_dir, depth) {
                continue;
            }
            children.push(self.explorer.resolve(self.side, self.path.join(entry.file_name()))?);
        }

        children.sort_by(|a, b| b.is_dir().cmp(&a.is_dir()).then_with(|| a.name().cmp(&b.name())));
        Ok(children)
    }
}

/// A file under one of the roots, with its side-car digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    side: Side,
    path: PathBuf,
    full_path: PathBuf,
    store: HashStore,
}

impl File {
    pub(crate) fn new(side: Side, root: &Path, path: PathBuf, chunk_size: usize) -> Self {
        let full_path = root.join(&path);
        let store = HashStore::new(full_path.clone(), chunk_size);
        Self {
            side,
            path,
            full_path,
            store,
        }
    }

    /// Side this file belongs to.
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Path relative to the root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path.
    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// File name.
    #[must_use]
    pub fn name(&self) -> String {
        display_name(&self.path)
    }

    /// Side-car store of this file.
    #[must_use]
    pub fn hash_store(&self) -> &HashStore {
        &self.store
    }

    /// Whether the file exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.full_path.is_file()
    }

    /// On-disk length plus [`SIDECAR_OVERHEAD`], or 0 if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Io`] if metadata cannot be read.
    pub fn size(&self) -> ExplorerResult<u64> {
        match fs::metadata(&self.full_path) {
            Ok(meta) if meta.is_file() => Ok(meta.len() + SIDECAR_OVERHEAD),
            Ok(_) => Ok(0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(ExplorerError::io(&self.full_path, e)),
        }
    }

    /// Digest of the current content, empty if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Io`] on read failures.
    pub fn hash(&self) -> ExplorerResult<String> {
        self.store.compute()
    }

    /// Digest stored in the side-car, empty if never hashed.
    ///
    /// Trailing whitespace is trimmed, so a side-car holding only whitespace
    /// reads as never hashed and the file is not reported corrupt.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Io`] on read failures.
    pub fn clean_hash(&self) -> ExplorerResult<String> {
        self.store.load()
    }

    /// Whether a side-car exists and disagrees with the content.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Io`] on read failures.
    pub fn corrupt(&self) -> ExplorerResult<bool> {
        let clean = self.clean_hash()?;
        if clean.is_empty() {
            return Ok(false);
        }
        let current = self.hash()?;
        if clean != current {
            log::warn!("Digest mismatch for {}", self.full_path.display());
            return Ok(true);
        }
        Ok(false)
    }

    /// Write the current digest to the side-car, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Io`] on read or write failures.
    pub fn update_hash_file(&self) -> ExplorerResult<String> {
        self.store.refresh()
    }
}
