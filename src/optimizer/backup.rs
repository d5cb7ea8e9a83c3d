//! One-time full snapshot of the asset tree.
//!
//! Provides [`BackupManager`] for creating the pre-mutation backup the
//! destructive image conversion relies on. Backups are created at most once
//! per root; an existing backup is trusted only after a structural
//! completeness check, since a previously interrupted copy is not a safety
//! net.

use crate::store::{AssetStore, RealAssetStore, TreeSummary};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker file recording what a completed backup contained
const MARKER_NAME: &str = ".backup_complete.json";

/// Errors that can occur during backup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Failed to copy the asset tree
    #[error("Failed to copy asset tree: {0}")]
    Copy(#[source] io::Error),

    /// Failed to write or read the completion marker
    #[error("Failed to record backup completion: {0}")]
    Marker(#[source] io::Error),

    /// A partial backup could not be cleaned up after a failed copy
    #[error("Failed to remove partial backup at {path}: {source}")]
    Cleanup {
        /// Partial backup location
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

/// How `ensure_backup` concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStatus {
    /// A fresh, complete backup was created
    Created,
    /// A structurally complete backup already existed; nothing was copied
    AlreadyExists,
}

#[derive(Serialize, Deserialize, PartialEq, Eq)]
struct Marker {
    file_count: u64,
    total_bytes: u64,
}

impl From<TreeSummary> for Marker {
    fn from(s: TreeSummary) -> Self {
        Self {
            file_count: s.file_count,
            total_bytes: s.total_bytes,
        }
    }
}

/// Manages the at-most-once asset tree snapshot
pub struct BackupManager<S: AssetStore = RealAssetStore> {
    store: S,
}

impl BackupManager<RealAssetStore> {
    /// Create a backup manager over the real filesystem
    pub fn new() -> Self {
        Self::with_store(RealAssetStore)
    }
}

impl Default for BackupManager<RealAssetStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AssetStore> BackupManager<S> {
    /// Create a backup manager with a custom store implementation
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    /// Ensure a complete backup of `subtrees` (relative to `root`) exists
    /// under `backup_root`.
    ///
    /// An existing backup is reused only when its completion marker matches
    /// what is actually on disk inside it; anything else is treated as an
    /// interrupted copy, removed, and redone. On any copy failure the
    /// partial `backup_root` is deleted and the error is returned; callers
    /// must treat that as fatal.
    pub fn ensure_backup(
        &self,
        root: &Path,
        backup_root: &Path,
        subtrees: &[PathBuf],
    ) -> Result<BackupStatus, BackupError> {
        if self.store.exists(backup_root) {
            if self.is_complete(backup_root)? {
                log::info!("backup at {} is complete, skipping", backup_root.display());
                return Ok(BackupStatus::AlreadyExists);
            }
            log::warn!(
                "backup at {} is incomplete, recreating",
                backup_root.display()
            );
            self.store
                .remove_tree(backup_root)
                .map_err(|source| BackupError::Cleanup {
                    path: backup_root.to_path_buf(),
                    source,
                })?;
        }

        match self.copy_subtrees(root, backup_root, subtrees) {
            Ok(()) => Ok(BackupStatus::Created),
            Err(e) => {
                // Never leave a partial snapshot behind to be mistaken for
                // a valid one on the next run.
                self.store
                    .remove_tree(backup_root)
                    .map_err(|source| BackupError::Cleanup {
                        path: backup_root.to_path_buf(),
                        source,
                    })?;
                Err(e)
            }
        }
    }

    fn copy_subtrees(
        &self,
        root: &Path,
        backup_root: &Path,
        subtrees: &[PathBuf],
    ) -> Result<(), BackupError> {
        self.store
            .create_dir(backup_root)
            .map_err(BackupError::Copy)?;
        for subtree in subtrees {
            let src = root.join(subtree);
            if !self.store.exists(&src) {
                continue;
            }
            self.store
                .copy_tree(&src, &backup_root.join(subtree))
                .map_err(BackupError::Copy)?;
        }

        let summary = self
            .store
            .tree_summary(backup_root)
            .map_err(BackupError::Marker)?;
        let marker = serde_json::to_vec(&Marker::from(summary))
            .map_err(|e| BackupError::Marker(io::Error::other(e)))?;
        self.store
            .write_atomic(&backup_root.join(MARKER_NAME), &marker)
            .map_err(BackupError::Marker)?;
        Ok(())
    }

    /// Completeness check: the marker must exist and match the backup's
    /// own current file count and total size (marker excluded).
    fn is_complete(&self, backup_root: &Path) -> Result<bool, BackupError> {
        let marker_path = backup_root.join(MARKER_NAME);
        if !self.store.exists(&marker_path) {
            return Ok(false);
        }
        let bytes = self.store.read(&marker_path).map_err(BackupError::Marker)?;
        let Ok(marker) = serde_json::from_slice::<Marker>(&bytes) else {
            return Ok(false);
        };

        let mut actual = self
            .store
            .tree_summary(backup_root)
            .map_err(BackupError::Marker)?;
        actual.file_count -= 1;
        actual.total_bytes -= bytes.len() as u64;

        Ok(marker == Marker::from(actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn seed_assets(root: &Path) -> Vec<PathBuf> {
        let images = root.join("assets/imagens/bigsize");
        let data = root.join("assets/database");
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&data).unwrap();
        fs::write(images.join("a.jpg"), b"fake jpeg bytes").unwrap();
        fs::write(data.join("db.json"), br#"{"k":1}"#).unwrap();
        vec![
            PathBuf::from("assets/imagens/bigsize"),
            PathBuf::from("assets/database"),
        ]
    }

    #[test]
    fn test_first_run_creates_backup_with_marker() {
        let temp = TempDir::new().unwrap();
        let subtrees = seed_assets(temp.path());
        let backup = temp.path().join("assets_backup");

        let status = BackupManager::new()
            .ensure_backup(temp.path(), &backup, &subtrees)
            .unwrap();

        assert_eq!(status, BackupStatus::Created);
        assert!(backup.join("assets/imagens/bigsize/a.jpg").exists());
        assert!(backup.join("assets/database/db.json").exists());
        assert!(backup.join(MARKER_NAME).exists());
    }

    #[test]
    fn test_second_run_is_noop_even_after_tree_mutation() {
        let temp = TempDir::new().unwrap();
        let subtrees = seed_assets(temp.path());
        let backup = temp.path().join("assets_backup");
        let manager = BackupManager::new();

        manager
            .ensure_backup(temp.path(), &backup, &subtrees)
            .unwrap();

        // Simulate the transform phase mutating the live tree.
        fs::remove_file(temp.path().join("assets/imagens/bigsize/a.jpg")).unwrap();
        fs::write(
            temp.path().join("assets/imagens/bigsize/a.webp"),
            b"webp",
        )
        .unwrap();

        let status = manager
            .ensure_backup(temp.path(), &backup, &subtrees)
            .unwrap();
        assert_eq!(status, BackupStatus::AlreadyExists);
        // Pristine backup untouched.
        assert!(backup.join("assets/imagens/bigsize/a.jpg").exists());
        assert!(!backup.join("assets/imagens/bigsize/a.webp").exists());
    }

    #[test]
    fn test_interrupted_backup_without_marker_is_recreated() {
        let temp = TempDir::new().unwrap();
        let subtrees = seed_assets(temp.path());
        let backup = temp.path().join("assets_backup");

        // A partial copy from an interrupted prior run: directory exists,
        // no completion marker.
        fs::create_dir_all(backup.join("assets/imagens/bigsize")).unwrap();
        fs::write(backup.join("assets/imagens/bigsize/a.jpg"), b"trunc").unwrap();

        let status = BackupManager::new()
            .ensure_backup(temp.path(), &backup, &subtrees)
            .unwrap();

        assert_eq!(status, BackupStatus::Created);
        assert_eq!(
            fs::read(backup.join("assets/imagens/bigsize/a.jpg")).unwrap(),
            b"fake jpeg bytes"
        );
        assert!(backup.join("assets/database/db.json").exists());
    }

    #[test]
    fn test_backup_with_stale_marker_is_recreated() {
        let temp = TempDir::new().unwrap();
        let subtrees = seed_assets(temp.path());
        let backup = temp.path().join("assets_backup");

        fs::create_dir_all(&backup).unwrap();
        fs::write(
            backup.join(MARKER_NAME),
            br#"{"file_count":99,"total_bytes":12345}"#,
        )
        .unwrap();

        let status = BackupManager::new()
            .ensure_backup(temp.path(), &backup, &subtrees)
            .unwrap();
        assert_eq!(status, BackupStatus::Created);
        assert!(backup.join("assets/imagens/bigsize/a.jpg").exists());
    }

    #[test]
    fn test_missing_subtree_is_skipped_not_fatal() {
        let temp = TempDir::new().unwrap();
        let backup = temp.path().join("assets_backup");

        let status = BackupManager::new()
            .ensure_backup(
                temp.path(),
                &backup,
                &[PathBuf::from("assets/nonexistent")],
            )
            .unwrap();
        assert_eq!(status, BackupStatus::Created);
        assert!(backup.join(MARKER_NAME).exists());
    }
}
