//! Structured-data compaction: lossless JSON minification.
//!
//! Each JSON file is parsed, re-serialized with no insignificant
//! whitespace, and overwritten only when the minified form parses back to
//! an equal value and is no larger than the original. A file that fails to
//! parse is skipped with a recorded reason; the run continues.

use crate::fmt::{format_bytes, reduction_percent};
use crate::inventory::AssetRecord;
use crate::optimizer::FileOutcome;
use crate::pipeline::OptimizationStats;
use crate::store::{AssetStore, RealAssetStore};
use console::style;
use serde_json::Value;

/// Reductions below this are not worth a console line
const REPORT_THRESHOLD_PERCENT: f64 = 5.0;

/// Compacts one JSON file per work item
pub struct DataCompactor<S: AssetStore = RealAssetStore> {
    store: S,
}

impl DataCompactor<RealAssetStore> {
    /// Create a compactor over the real filesystem
    pub fn new() -> Self {
        Self::with_store(RealAssetStore)
    }
}

impl Default for DataCompactor<RealAssetStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AssetStore> DataCompactor<S> {
    /// Create a compactor with a custom store implementation
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    /// Process a single structured-data record.
    pub fn process(&self, record: &AssetRecord, stats: &OptimizationStats) -> FileOutcome {
        let name = record.name();

        let original = match self.store.read(&record.abs_path) {
            Ok(b) => b,
            Err(e) => return self.skip(name, format!("read failed: {e}")),
        };

        let value: Value = match serde_json::from_slice(&original) {
            Ok(v) => v,
            Err(e) => return self.skip(name, format!("parse failed: {e}")),
        };

        let minified = match serde_json::to_vec(&value) {
            Ok(m) => m,
            Err(e) => return self.skip(name, format!("serialize failed: {e}")),
        };

        // Round-trip law: never overwrite with bytes that do not decode to
        // the same value.
        match serde_json::from_slice::<Value>(&minified) {
            Ok(reparsed) if reparsed == value => {}
            _ => return self.skip(name, "round-trip check failed".to_string()),
        }

        if minified.len() as u64 > record.size {
            stats.record_data_file(record.size, false);
            return FileOutcome::Unchanged { name };
        }

        if minified == original {
            stats.record_data_file(record.size, false);
            return FileOutcome::Unchanged { name };
        }

        if let Err(e) = self.store.write_atomic(&record.abs_path, &minified) {
            return self.skip(name, format!("write failed: {e}"));
        }

        let after = minified.len() as u64;
        stats.record_data_file(after, true);
        self.report_reduction(&name, record.size, after);

        FileOutcome::Compacted {
            name,
            before: record.size,
            after,
        }
    }

    fn report_reduction(&self, name: &str, before: u64, after: u64) {
        let reduction = reduction_percent(before, after);
        if reduction > REPORT_THRESHOLD_PERCENT {
            println!(
                "  {} {}: {} → {} (-{:.1}%)",
                style("✓").green(),
                name,
                format_bytes(before),
                format_bytes(after),
                reduction
            );
        }
    }

    fn skip(&self, name: impl Into<String>, reason: String) -> FileOutcome {
        let name = name.into();
        log::warn!("skipping data file {name}: {reason}");
        FileOutcome::Skipped { name, reason }
    }
}
