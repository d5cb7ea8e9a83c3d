//! Asset inventory: walking the store and classifying files.
//!
//! Produces [`AssetRecord`]s for every image and structured-data file under
//! the configured subpaths, plus the aggregate tree size. The walk is
//! read-only and re-runnable, so the report phase can use it again after
//! transformation to obtain ground truth.

use crate::store::{AssetStore, RealAssetStore};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Classification of an asset file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Raster image subject to resize/re-encode
    Image,
    /// Structured-data (JSON) file subject to compaction
    Data,
}

/// A single asset discovered during inventory.
///
/// `rel_path` is the unique key within a run. Size and format reflect the
/// state at scan time; a post-transformation rescan produces fresh records.
#[derive(Debug, Clone)]
pub struct AssetRecord {
    /// Path relative to the asset root
    pub rel_path: PathBuf,
    /// Absolute path on disk
    pub abs_path: PathBuf,
    /// Byte size at scan time
    pub size: u64,
    /// Lowercased extension, e.g. "jpg", "webp", "json"
    pub format: String,
    /// Pixel dimensions, images only, None when the header is unreadable
    pub dimensions: Option<(u32, u32)>,
    /// Classification
    pub kind: AssetKind,
    /// Membership in the static critical allow-list
    pub critical: bool,
}

impl AssetRecord {
    /// File name component, used for manifest entries and allow-list checks
    pub fn name(&self) -> String {
        self.abs_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Result of a full inventory pass
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    /// Image assets under the images subpath
    pub images: Vec<AssetRecord>,
    /// Structured-data assets under the data subpath
    pub data_files: Vec<AssetRecord>,
    /// Aggregate size of all inventoried assets in bytes
    pub total_bytes: u64,
}

/// Walks the asset store and classifies files.
pub struct AssetInventory<S: AssetStore = RealAssetStore> {
    root: PathBuf,
    images_subpath: PathBuf,
    data_subpath: PathBuf,
    critical: BTreeSet<String>,
    store: S,
}

impl AssetInventory<RealAssetStore> {
    /// Create an inventory over the real filesystem
    pub fn new(
        root: impl Into<PathBuf>,
        images_subpath: impl Into<PathBuf>,
        data_subpath: impl Into<PathBuf>,
        critical: impl IntoIterator<Item = String>,
    ) -> Self {
        Self::with_store(root, images_subpath, data_subpath, critical, RealAssetStore)
    }
}

impl AssetInventory {
    /// Classify a path by extension. Returns None for files the pipeline ignores.
    pub fn classify(path: &Path) -> Option<AssetKind> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())?;
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" => Some(AssetKind::Image),
            "json" => Some(AssetKind::Data),
            _ => None,
        }
    }
}

impl<S: AssetStore> AssetInventory<S> {
    /// Create an inventory with a custom store implementation
    pub fn with_store(
        root: impl Into<PathBuf>,
        images_subpath: impl Into<PathBuf>,
        data_subpath: impl Into<PathBuf>,
        critical: impl IntoIterator<Item = String>,
        store: S,
    ) -> Self {
        Self {
            root: root.into(),
            images_subpath: images_subpath.into(),
            data_subpath: data_subpath.into(),
            critical: critical.into_iter().collect(),
            store,
        }
    }

    /// Scan the store and build the inventory.
    ///
    /// Images are collected under the images subpath, JSON files under the
    /// data subpath (recursively). Files of other kinds contribute nothing.
    pub fn scan(&self) -> std::io::Result<Inventory> {
        let mut inventory = Inventory::default();

        let images_root = self.root.join(&self.images_subpath);
        if self.store.exists(&images_root) {
            for path in self.store.list(&images_root)? {
                if AssetInventory::classify(&path) != Some(AssetKind::Image) {
                    continue;
                }
                let record = self.record_for(&path, AssetKind::Image)?;
                inventory.total_bytes += record.size;
                inventory.images.push(record);
            }
        }

        let data_root = self.root.join(&self.data_subpath);
        if self.store.exists(&data_root) {
            for path in self.store.list(&data_root)? {
                if AssetInventory::classify(&path) != Some(AssetKind::Data) {
                    continue;
                }
                let record = self.record_for(&path, AssetKind::Data)?;
                inventory.total_bytes += record.size;
                inventory.data_files.push(record);
            }
        }

        // Deterministic order for downstream consumers.
        inventory.images.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        inventory
            .data_files
            .sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

        Ok(inventory)
    }

    fn record_for(&self, path: &Path, kind: AssetKind) -> std::io::Result<AssetRecord> {
        let size = self.store.size(path)?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let dimensions = if kind == AssetKind::Image {
            self.probe_dimensions(path)
        } else {
            None
        };

        Ok(AssetRecord {
            rel_path: path.strip_prefix(&self.root).unwrap_or(path).to_path_buf(),
            abs_path: path.to_path_buf(),
            size,
            format,
            dimensions,
            kind,
            critical: self.critical.contains(&name),
        })
    }

    /// Read image dimensions from the encoded header, None on any failure.
    /// Only the header is read, never the full file.
    fn probe_dimensions(&self, path: &Path) -> Option<(u32, u32)> {
        image::image_dimensions(path).ok()
    }
}
