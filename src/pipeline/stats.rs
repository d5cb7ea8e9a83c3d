//! Incrementally maintained optimization counters.
//!
//! Workers from the transform and compact phases record completions here
//! through atomic increments, so no lock is held on the hot path and no
//! update is lost. The counters are advisory: the report phase recomputes
//! the final size from disk independently.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters mutated by many workers
#[derive(Debug, Default)]
pub struct OptimizationStats {
    images_processed: AtomicU64,
    webp_converted: AtomicU64,
    resized_images: AtomicU64,
    data_files_compacted: AtomicU64,
    bytes_before: AtomicU64,
    bytes_after: AtomicU64,
}

impl OptimizationStats {
    /// Record the original aggregate size measured at inventory time
    pub fn set_bytes_before(&self, bytes: u64) {
        self.bytes_before.store(bytes, Ordering::Relaxed);
    }

    /// Record a processed image and the size of whichever file now
    /// represents the asset
    pub fn record_image(&self, bytes_after: u64, converted: bool, resized: bool) {
        self.images_processed.fetch_add(1, Ordering::Relaxed);
        if converted {
            self.webp_converted.fetch_add(1, Ordering::Relaxed);
        }
        if resized {
            self.resized_images.fetch_add(1, Ordering::Relaxed);
        }
        self.bytes_after.fetch_add(bytes_after, Ordering::Relaxed);
    }

    /// Record a structured-data file that survived compaction
    pub fn record_data_file(&self, bytes_after: u64, compacted: bool) {
        if compacted {
            self.data_files_compacted.fetch_add(1, Ordering::Relaxed);
        }
        self.bytes_after.fetch_add(bytes_after, Ordering::Relaxed);
    }

    /// Take a consistent-enough snapshot of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            images_processed: self.images_processed.load(Ordering::Relaxed),
            webp_converted: self.webp_converted.load(Ordering::Relaxed),
            resized_images: self.resized_images.load(Ordering::Relaxed),
            data_files_compacted: self.data_files_compacted.load(Ordering::Relaxed),
            bytes_before: self.bytes_before.load(Ordering::Relaxed),
            bytes_after: self.bytes_after.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value snapshot of [`OptimizationStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Images successfully processed
    pub images_processed: u64,
    /// Non-critical images converted to WebP
    pub webp_converted: u64,
    /// Images that went through the cover-fit resize
    pub resized_images: u64,
    /// JSON files whose minified form was written back
    pub data_files_compacted: u64,
    /// Aggregate asset size at inventory time
    pub bytes_before: u64,
    /// Sum of post-transformation sizes recorded by workers
    pub bytes_after: u64,
}

impl StatsSnapshot {
    /// Size reduction as a percentage of the original size
    pub fn compression_ratio(&self, final_bytes: u64) -> f64 {
        crate::fmt::reduction_percent(self.bytes_before, final_bytes)
    }
}
