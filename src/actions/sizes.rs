//! Sizes of a path on both sides.

use std::path::Path;

use serde::Serialize;

use crate::explorer::{Explorer, ExplorerResult, Side};

/// Sizes of one relative path on the source and destination sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PairSizes {
    /// Source-side size in bytes
    pub src_size: u64,
    /// Destination-side size in bytes
    pub dst_size: u64,
}

/// Aggregate sizes of a directory (or file) on both sides.
///
/// # Errors
///
/// Propagates path, I/O and traversal errors.
pub fn dir_sizes(explorer: &Explorer, relative: &Path) -> ExplorerResult<PairSizes> {
    Ok(PairSizes {
        src_size: explorer.resolve(Side::Source, relative)?.size()?,
        dst_size: explorer.resolve(Side::Destination, relative)?.size()?,
    })
}

/// Sizes of the paired files at `relative`; an absent side counts as 0.
///
/// Both sides are resolved first so the pair entry is up to date.
///
/// # Errors
///
/// Propagates path and I/O errors. A path that is a directory on both sides
/// has no pair entry and yields [`crate::explorer::ExplorerError::NotFound`].
pub fn file_sizes(explorer: &Explorer, relative: &Path) -> ExplorerResult<PairSizes> {
    explorer.resolve(Side::Source, relative)?;
    explorer.resolve(Side::Destination, relative)?;
    let entry = explorer.lookup(relative)?;

    let size_of = |side| match entry.file(side) {
        Some(file) => file.size(),
        None => Ok(0),
    };
    Ok(PairSizes {
        src_size: size_of(Side::Source)?,
        dst_size: size_of(Side::Destination)?,
    })
}
