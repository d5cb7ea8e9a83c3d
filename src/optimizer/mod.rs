//! Per-file asset transformation: backup, image re-encoding, JSON compaction.
//!
//! Each transformer processes one file per work item and reports a
//! [`FileOutcome`] value. A bad file is recorded and skipped; it never
//! aborts the run and no error from a single file crosses a component
//! boundary.

pub mod backup;
pub mod data;
pub mod images;

pub use backup::{BackupError, BackupManager, BackupStatus};
pub use data::DataCompactor;
pub use images::ImageTransformer;

/// Result of processing one file, produced by every worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Non-critical image converted to WebP; original deleted
    Converted {
        /// File name
        name: String,
        /// Size before
        before: u64,
        /// Size of the WebP now representing the asset
        after: u64,
    },
    /// Critical image re-encoded in place, same name and format
    Reencoded {
        /// File name
        name: String,
        /// Size before
        before: u64,
        /// Size after
        after: u64,
    },
    /// JSON file overwritten with its minified form
    Compacted {
        /// File name
        name: String,
        /// Size before
        before: u64,
        /// Size after
        after: u64,
    },
    /// File left untouched (already minimal, or minified form was larger)
    Unchanged {
        /// File name
        name: String,
    },
    /// File skipped with a recorded reason (decode/parse failure, cancellation)
    Skipped {
        /// File name
        name: String,
        /// Why the file was skipped
        reason: String,
    },
}

impl FileOutcome {
    /// File name this outcome refers to
    pub fn name(&self) -> &str {
        match self {
            Self::Converted { name, .. }
            | Self::Reencoded { name, .. }
            | Self::Compacted { name, .. }
            | Self::Unchanged { name }
            | Self::Skipped { name, .. } => name,
        }
    }

    /// Skip reason, if this outcome is a skip
    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Self::Skipped { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
