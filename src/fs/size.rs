//! Folder size probing.
//!
//! A folder's size is the sum of the byte lengths of its immediate regular
//! files. Hidden files count, subdirectories are not descended into, and a
//! folder that cannot be read has size 0.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Bytes per displayed kilobyte.
pub const BYTES_PER_KB: u64 = 1024;

/// Size of one directory at the time it was last probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySizeResult {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl DirectorySizeResult {
    /// Probe `path` now.
    pub fn probe(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            size_bytes: compute_size(path),
        }
    }

    /// Display value for the size column, e.g. `"2 KB"`.
    pub fn display(&self) -> String {
        format_kb(self.size_bytes)
    }
}

/// Sum the sizes of the immediate files in `path`.
///
/// Unreadable or missing directories yield 0.
pub fn compute_size(path: &Path) -> u64 {
    match try_compute_size(path) {
        Ok(size) => size,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "folder unreadable, size is 0");
            0
        }
    }
}

/// Like [`compute_size`], but returns the error when the directory itself
/// cannot be listed.
///
/// Entries that vanish or cannot be stat'ed mid-scan are skipped.
pub fn try_compute_size(path: &Path) -> io::Result<u64> {
    let mut total = 0u64;
    for entry in fs::read_dir(path)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        // Follow symlinks: a link to a file counts as that file, a dangling
        // link or a link to a directory does not count.
        let metadata = match fs::metadata(entry.path()) {
            Ok(m) => m,
            Err(_) => continue,
        };
        if metadata.is_file() {
            total = total.saturating_add(metadata.len());
        }
    }
    Ok(total)
}

/// Format a byte count as whole kilobytes, truncating.
pub fn format_kb(bytes: u64) -> String {
    format!("{} KB", bytes / BYTES_PER_KB)
}
