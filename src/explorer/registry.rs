//! Pairing of source-side and destination-side files.
//!
//! The registry holds one [`PairEntry`] per relative path. An entry remembers
//! the file handle resolved on each side and forgets a handle as soon as its
//! file disappears from disk. Entries are never removed except by
//! [`PairRegistry::clear`].
//!
//! # Locking
//!
//! The entry map is guarded by a single mutex held only for get-or-insert.
//! Each entry guards its two slots with its own mutex, so resolving different
//! paths proceeds in parallel while the same path is serialized. A separate
//! transfer lock per relative path serializes syncs into one destination.
//! Transfer locks live in their own map: taking one does not create an
//! entry, so [`PairRegistry::lookup`] still only finds resolved paths.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::item::File;
use super::{ExplorerError, ExplorerResult, Side};

#[derive(Debug, Default)]
struct PairSlots {
    source: Option<File>,
    destination: Option<File>,
}

impl PairSlots {
    fn slot(&mut self, side: Side) -> &mut Option<File> {
        match side {
            Side::Source => &mut self.source,
            Side::Destination => &mut self.destination,
        }
    }
}

/// Registry record linking the two sides of one relative path.
#[derive(Debug)]
pub struct PairEntry {
    path: PathBuf,
    slots: Mutex<PairSlots>,
    transfer: Arc<Mutex<()>>,
}

impl PairEntry {
    fn new(path: PathBuf, transfer: Arc<Mutex<()>>) -> Self {
        Self {
            path,
            slots: Mutex::new(PairSlots::default()),
            transfer,
        }
    }

    /// Relative path this entry is keyed by.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn slots(&self) -> MutexGuard<'_, PairSlots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the handle in `slot` if its file no longer exists.
    fn revalidate(slot: &mut Option<File>) {
        if slot.as_ref().is_some_and(|file| !file.exists()) {
            if let Some(stale) = slot.take() {
                log::debug!("Forgetting stale handle: {}", stale.full_path().display());
            }
        }
    }

    /// The handle for `side`, if one was resolved and its file still exists.
    #[must_use]
    pub fn file(&self, side: Side) -> Option<File> {
        let mut slots = self.slots();
        let slot = slots.slot(side);
        Self::revalidate(slot);
        slot.clone()
    }

    /// Source-side handle; see [`PairEntry::file`].
    #[must_use]
    pub fn src_file(&self) -> Option<File> {
        self.file(Side::Source)
    }

    /// Destination-side handle; see [`PairEntry::file`].
    #[must_use]
    pub fn dst_file(&self) -> Option<File> {
        self.file(Side::Destination)
    }

    /// The handle for `side`, creating it with `make` if absent or stale.
    pub(crate) fn file_or_insert_with(&self, side: Side, make: impl FnOnce() -> File) -> File {
        let mut slots = self.slots();
        let slot = slots.slot(side);
        Self::revalidate(slot);
        slot.get_or_insert_with(make).clone()
    }

    /// Hold while writing into this path on either side.
    pub fn lock_transfer(&self) -> MutexGuard<'_, ()> {
        self.transfer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-wide map from relative path to [`PairEntry`].
#[derive(Debug, Default)]
pub struct PairRegistry {
    entries: Mutex<HashMap<PathBuf, Arc<PairEntry>>>,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PairRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<PairEntry>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Entry for a normalized relative path, created if absent.
    pub(crate) fn entry(&self, path: &Path) -> Arc<PairEntry> {
        let mut entries = self.entries();
        if let Some(entry) = entries.get(path) {
            return Arc::clone(entry);
        }
        let entry = Arc::new(PairEntry::new(path.to_path_buf(), self.transfer_lock(path)));
        entries.insert(path.to_path_buf(), Arc::clone(&entry));
        entry
    }

    /// Transfer lock for a normalized relative path, shared with its entry.
    ///
    /// Lock order: the entry map before the lock map.
    pub(crate) fn transfer_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    /// Entry for a normalized relative path.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::NotFound`] if no entry was ever created.
    pub fn lookup(&self, path: &Path) -> ExplorerResult<Arc<PairEntry>> {
        self.entries()
            .get(path)
            .cloned()
            .ok_or_else(|| ExplorerError::NotFound(path.to_path_buf()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether no entry was created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries().clear();
    }
}
