//! Single-path integrity checks.

use std::path::Path;

use crate::explorer::{Explorer, ExplorerResult, Item, Side};

/// Whether the file at `relative` disagrees with its side-car.
///
/// Directories and unhashed files report `false`.
///
/// # Errors
///
/// Propagates path and I/O errors.
pub fn check_integrity(explorer: &Explorer, side: Side, relative: &Path) -> ExplorerResult<bool> {
    explorer.resolve(side, relative)?.corrupt()
}

/// Refresh the side-car of the file at `relative` and return the stored digest.
///
/// Directories are left alone and yield an empty digest.
///
/// # Errors
///
/// Propagates path and I/O errors.
pub fn update_hash(explorer: &Explorer, side: Side, relative: &Path) -> ExplorerResult<String> {
    match explorer.resolve(side, relative)? {
        Item::File(file) => {
            file.update_hash_file()?;
            file.clean_hash()
        }
        Item::Directory(_) => Ok(String::new()),
    }
}
