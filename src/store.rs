//! Storage abstraction for asset trees.
//!
//! This module provides the [`AssetStore`] trait, the only component that
//! touches persistent storage. All mutation goes through [`write_atomic`]
//! (write to a temporary sibling, then rename) so an observer never sees a
//! partially written file, and every operation is safe to retry.
//!
//! [`write_atomic`]: AssetStore::write_atomic

use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File count and aggregate byte size of a directory tree.
///
/// Used for backup completeness checks and ground-truth size recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeSummary {
    /// Number of regular files in the tree
    pub file_count: u64,
    /// Sum of file sizes in bytes
    pub total_bytes: u64,
}

/// Trait for abstracting asset storage operations.
///
/// Allows dependency injection of storage, keeping the pipeline testable
/// against temporary directories and alternative backends.
pub trait AssetStore {
    /// Recursively list all regular files under `root`, in unspecified order.
    fn list(&self, root: &Path) -> io::Result<Vec<PathBuf>>;

    /// Read the entire contents of a file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write `bytes` to `path` atomically.
    ///
    /// Writes to a uniquely named temporary file in the same directory and
    /// renames it over the destination. Re-running a write with identical
    /// bytes is a no-op.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Delete a single file. Deleting an already-absent file is a no-op.
    fn delete(&self, path: &Path) -> io::Result<()>;

    /// Create a directory and any missing parents.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Byte size of a single file.
    fn size(&self, path: &Path) -> io::Result<u64>;

    /// Whether a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Recursively copy `src` to `dst`, returning the summary of what was copied.
    fn copy_tree(&self, src: &Path, dst: &Path) -> io::Result<TreeSummary>;

    /// Recursively delete a directory tree. Absent trees are a no-op.
    fn remove_tree(&self, path: &Path) -> io::Result<()>;

    /// File count and total size of the tree under `root`.
    fn tree_summary(&self, root: &Path) -> io::Result<TreeSummary> {
        let mut summary = TreeSummary::default();
        for file in self.list(root)? {
            summary.file_count += 1;
            summary.total_bytes += self.size(&file)?;
        }
        Ok(summary)
    }
}

/// Real storage implementation that delegates to std::fs.
#[derive(Debug, Clone, Copy)]
pub struct RealAssetStore;

impl RealAssetStore {
    fn walk(&self, dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.walk(&path, out)?;
            } else if path.is_file() {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl AssetStore for RealAssetStore {
    fn list(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if root.is_file() {
            files.push(root.to_path_buf());
            return Ok(files);
        }
        self.walk(root, &mut files)?;
        Ok(files)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        // Identical content already on disk: retrying the write is a no-op.
        if let Ok(existing) = std::fs::metadata(path) {
            if existing.len() == bytes.len() as u64 && std::fs::read(path)? == bytes {
                return Ok(());
            }
        }

        let dir = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent")
        })?;
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "destination has no filename")
        })?;

        let tmp = dir.join(format!(
            ".{}.{}.tmp",
            file_name.to_string_lossy(),
            Uuid::new_v4().simple()
        ));
        std::fs::write(&tmp, bytes)?;

        // Rename within the same directory so the swap is atomic.
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = std::fs::remove_file(&tmp);
                Err(e)
            }
        }
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn copy_tree(&self, src: &Path, dst: &Path) -> io::Result<TreeSummary> {
        let mut summary = TreeSummary::default();
        std::fs::create_dir_all(dst)?;
        for entry in std::fs::read_dir(src)? {
            let entry = entry?;
            let from = entry.path();
            let to = dst.join(entry.file_name());
            if from.is_dir() {
                let sub = self.copy_tree(&from, &to)?;
                summary.file_count += sub.file_count;
                summary.total_bytes += sub.total_bytes;
            } else if from.is_file() {
                summary.file_count += 1;
                summary.total_bytes += std::fs::copy(&from, &to)?;
            }
        }
        Ok(summary)
    }

    fn remove_tree(&self, path: &Path) -> io::Result<()> {
        match std::fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
