//! Chunked compare-and-patch synchronization.
//!
//! The destination is walked in fixed-size chunks at the same offsets as the
//! source. A chunk is rewritten only when its BLAKE3 digest differs from the
//! source chunk at that offset; a longer destination is truncated and a
//! shorter one is extended.
//!
//! Offsets are never realigned, so an insertion or deletion in the source
//! makes every later chunk differ and be rewritten.

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};

use serde::Serialize;

use super::item::File;
use super::{read_chunk, ExplorerError, ExplorerResult};

/// What a sync did to the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Destination did not exist and was copied in full.
    pub created: bool,
    /// Chunk pairs whose digests were compared.
    pub chunks_compared: u64,
    /// Chunks written into the destination.
    pub chunks_written: u64,
    /// Bytes written into the destination.
    pub bytes_written: u64,
    /// Destination was longer than the source and was cut.
    pub truncated: bool,
}

impl SyncStats {
    /// Whether the destination was modified at all.
    #[must_use]
    pub fn modified(&self) -> bool {
        self.created || self.chunks_written > 0 || self.truncated
    }
}

/// Make `dst` byte-identical to `src` without locking.
///
/// Callers that may run concurrently must hold the destination's transfer
/// lock (see [`super::PairEntry::lock_transfer`]) or use
/// [`super::Explorer::sync`].
///
/// # Errors
///
/// Returns [`ExplorerError::Io`] for any read, write, seek or truncate
/// failure, including a missing source.
pub fn sync_files(src: &File, dst: &File, chunk_size: usize) -> ExplorerResult<SyncStats> {
    let chunk_size = chunk_size.max(1);
    if dst.exists() {
        patch(src, dst, chunk_size)
    } else {
        copy(src, dst, chunk_size)
    }
}

fn copy(src: &File, dst: &File, chunk_size: usize) -> ExplorerResult<SyncStats> {
    let src_path = src.full_path();
    let dst_path = dst.full_path();
    log::debug!(
        "Copying {} -> {}",
        src_path.display(),
        dst_path.display()
    );

    let mut source = fs::File::open(src_path).map_err(|e| ExplorerError::io(src_path, e))?;
    if let Some(parent) = dst_path.parent() {
        fs::create_dir_all(parent).map_err(|e| ExplorerError::io(parent, e))?;
    }
    let mut target = fs::File::create(dst_path).map_err(|e| ExplorerError::io(dst_path, e))?;

    let mut stats = SyncStats {
        created: true,
        ..SyncStats::default()
    };
    let mut buffer = vec![0u8; chunk_size];
    loop {
        let n = read_chunk(&mut source, &mut buffer).map_err(|e| ExplorerError::io(src_path, e))?;
        if n == 0 {
            break;
        }
        target
            .write_all(&buffer[..n])
            .map_err(|e| ExplorerError::io(dst_path, e))?;
        stats.chunks_written += 1;
        stats.bytes_written += n as u64;
    }
    target.flush().map_err(|e| ExplorerError::io(dst_path, e))?;
    Ok(stats)
}

fn patch(src: &File, dst: &File, chunk_size: usize) -> ExplorerResult<SyncStats> {
    let src_path = src.full_path();
    let dst_path = dst.full_path();
    log::debug!(
        "Patching {} -> {}",
        src_path.display(),
        dst_path.display()
    );

    let mut source = fs::File::open(src_path).map_err(|e| ExplorerError::io(src_path, e))?;
    let mut target = OpenOptions::new()
        .read(true)
        .write(true)
        .open(dst_path)
        .map_err(|e| ExplorerError::io(dst_path, e))?;
    let dst_io = |e: std::io::Error| ExplorerError::io(dst_path, e);

    let mut stats = SyncStats::default();
    let mut src_buf = vec![0u8; chunk_size];
    let mut dst_buf = vec![0u8; chunk_size];
    let mut position = 0u64;

    loop {
        let src_len =
            read_chunk(&mut source, &mut src_buf).map_err(|e| ExplorerError::io(src_path, e))?;
        if src_len == 0 {
            let dst_len = target.metadata().map_err(dst_io)?.len();
            if dst_len > position {
                log::trace!("Truncating {} at {}", dst_path.display(), position);
                target.set_len(position).map_err(dst_io)?;
                stats.truncated = true;
            }
            break;
        }
        let src_chunk = &src_buf[..src_len];

        target.seek(SeekFrom::Start(position)).map_err(dst_io)?;
        let dst_len = read_chunk(&mut target, &mut dst_buf[..src_len]).map_err(dst_io)?;

        let differs = if dst_len == 0 {
            true
        } else {
            stats.chunks_compared += 1;
            blake3::hash(src_chunk) != blake3::hash(&dst_buf[..dst_len])
        };

        if differs {
            log::trace!("Rewriting chunk at {} in {}", position, dst_path.display());
            target.seek(SeekFrom::Start(position)).map_err(dst_io)?;
            target.write_all(src_chunk).map_err(dst_io)?;
            stats.chunks_written += 1;
            stats.bytes_written += src_len as u64;
        }

        position += src_len as u64;
    }

    target.flush().map_err(dst_io)?;
    log::debug!(
        "Patched {}: {} of {} chunks rewritten",
        dst_path.display(),
        stats.chunks_written,
        stats.chunks_compared
    );
    Ok(stats)
}
