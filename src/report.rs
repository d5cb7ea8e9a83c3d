//! Final report: recomputed ground truth and the budget verdict.
//!
//! The report never trusts the incrementally maintained counters for the
//! verdict: the final size is recomputed by walking the store again, so
//! drift introduced by per-file failures during transformation cannot
//! produce a false pass.

use crate::pipeline::{PipelineConfig, StatsSnapshot};
use crate::store::{AssetStore, RealAssetStore};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;

/// Report file name, written at the asset root
pub const REPORT_FILE_NAME: &str = "optimization_report.json";

/// Counter block persisted inside the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportStats {
    /// Aggregate asset size at inventory time, bytes
    pub original_size: u64,
    /// Recomputed aggregate size after the run, bytes
    pub optimized_size: u64,
    /// Images successfully processed
    pub images_processed: u64,
    /// Original-format files removed after conversion
    pub images_removed: u64,
    /// Non-critical images converted to WebP
    pub webp_converted: u64,
    /// Images that went through the cover-fit resize
    pub resized_images: u64,
    /// Size reduction as a percentage of the original size
    pub compression_ratio: f64,
}

/// Terminal artifact of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// When the run finished
    pub timestamp: String,
    /// Counter snapshot cross-checked against the recomputed size
    pub stats: ReportStats,
    /// Recomputed final size in MB, rounded to two decimals
    pub final_size_mb: f64,
    /// Whether the recomputed final size is within the budget
    pub target_achieved: bool,
}

impl Report {
    /// Advisory suggestions shown when the budget was missed. Never acted
    /// on automatically.
    pub fn suggestions(&self) -> Vec<String> {
        if self.target_achieved {
            return Vec::new();
        }
        vec![
            "Move more images to remote hosting".to_string(),
            "Reduce WebP quality to 75".to_string(),
            "Lazy-load the JSON database".to_string(),
        ]
    }
}

/// Recomputes ground truth and renders the verdict
pub struct ReportGenerator<S: AssetStore = RealAssetStore> {
    root: PathBuf,
    images_subpath: PathBuf,
    data_subpath: PathBuf,
    budget_bytes: u64,
    store: S,
}

impl ReportGenerator<RealAssetStore> {
    /// Create a generator over the real filesystem
    pub fn new(root: impl Into<PathBuf>, config: &PipelineConfig) -> Self {
        Self::with_store(root, config, RealAssetStore)
    }
}

impl<S: AssetStore> ReportGenerator<S> {
    /// Create a generator with a custom store implementation
    pub fn with_store(root: impl Into<PathBuf>, config: &PipelineConfig, store: S) -> Self {
        Self {
            root: root.into(),
            images_subpath: config.images_subpath.clone(),
            data_subpath: config.data_subpath.clone(),
            budget_bytes: config.budget_bytes,
            store,
        }
    }

    /// Walk the asset subtrees and sum on-disk file sizes, independently of
    /// any counter maintained during transformation.
    pub fn final_size(&self) -> io::Result<u64> {
        let mut total = 0;
        for subpath in [&self.images_subpath, &self.data_subpath] {
            let dir = self.root.join(subpath);
            if self.store.exists(&dir) {
                total += self.store.tree_summary(&dir)?.total_bytes;
            }
        }
        Ok(total)
    }

    /// Build the report from the counter snapshot plus recomputed truth.
    pub fn generate(&self, snapshot: &StatsSnapshot) -> io::Result<Report> {
        let final_size = self.final_size()?;

        Ok(Report {
            timestamp: format_timestamp(),
            stats: ReportStats {
                original_size: snapshot.bytes_before,
                optimized_size: final_size,
                images_processed: snapshot.images_processed,
                images_removed: snapshot.webp_converted,
                webp_converted: snapshot.webp_converted,
                resized_images: snapshot.resized_images,
                compression_ratio: snapshot.compression_ratio(final_size),
            },
            final_size_mb: (final_size as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
            target_achieved: final_size <= self.budget_bytes,
        })
    }

    /// Budget this generator judges against, in bytes
    pub fn budget_bytes(&self) -> u64 {
        self.budget_bytes
    }
}

/// Format the current UTC time as an ISO 8601 timestamp with second
/// precision, e.g. `2026-08-31T14:05:09Z`.
fn format_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
