//! Directory listing with disk usage.

use std::path::{Component, Path};

use serde::Serialize;
use sysinfo::Disks;

use crate::explorer::{Explorer, ExplorerError, ExplorerResult, Item, Side};

/// One row of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    /// Display name (`.` and `..` for the navigation rows)
    pub name: String,
    /// Path relative to the root
    pub path: String,
    /// Whether the row is a directory
    pub directory: bool,
    /// Persisted digest, empty for directories and unhashed files
    pub clean_hash: String,
}

/// A directory listing on one side.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    /// Side that was listed
    pub side: Side,
    /// Listed path relative to the root
    pub path: String,
    /// Capacity of the filesystem holding the path, in bytes
    pub total_size: u64,
    /// Free space on that filesystem, in bytes
    pub free_size: u64,
    /// Breadcrumb components, starting with `~` for the root
    pub parts: Vec<String>,
    /// `.`, `..` (below the root), then the eligible children
    pub children: Vec<ListingEntry>,
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn nav_entry(name: &str, path: &Path) -> ListingEntry {
    ListingEntry {
        name: name.to_string(),
        path: path_string(path),
        directory: true,
        clean_hash: String::new(),
    }
}

/// Total and available bytes of the disk whose mount point holds `path`.
///
/// Falls back to zero when no mounted disk matches (e.g. in containers that
/// hide their mounts).
fn disk_usage(path: &Path) -> (u64, u64) {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().components().count())
        .map_or((0, 0), |disk| (disk.total_space(), disk.available_space()))
}

/// List the eligible children of a directory on `side`.
///
/// # Errors
///
/// Returns [`ExplorerError::Io`] if the path is not a readable directory.
pub fn browse(explorer: &Explorer, side: Side, relative: &Path) -> ExplorerResult<Listing> {
    let directory = match explorer.resolve(side, relative)? {
        Item::Directory(directory) => directory,
        Item::File(file) => {
            return Err(ExplorerError::io(
                file.full_path(),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }
    };

    let path = directory.path().to_path_buf();
    let mut children = vec![nav_entry(".", &path)];
    if !directory.is_root() {
        children.push(nav_entry("..", path.parent().unwrap_or(Path::new(""))));
    }

    for item in directory.children()? {
        children.push(ListingEntry {
            name: item.name(),
            path: path_string(item.path()),
            directory: item.is_dir(),
            clean_hash: item.clean_hash()?,
        });
    }

    let parts = std::iter::once("~".to_string())
        .chain(path.components().filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        }))
        .collect();

    let (total_size, free_size) = disk_usage(directory.full_path());
    log::debug!(
        "Listed {} children of {} ({})",
        children.len(),
        directory.full_path().display(),
        side
    );

    Ok(Listing {
        side,
        path: path_string(&path),
        total_size,
        free_size,
        parts,
        children,
    })
}
