//! Error types for the optimization pipeline
//!
//! Only fatal conditions are represented here. Per-file decode/parse
//! failures stay inside their work item as a skipped outcome and never
//! cross a component boundary as an error.

use crate::optimizer::BackupError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the whole pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Asset root path does not exist
    #[error("Asset root not found: {0}")]
    RootNotFound(PathBuf),

    /// Backup could not be established; without it the destructive
    /// transform phase has no safety net
    #[error("Backup could not be established: {0}")]
    Backup(#[from] BackupError),

    /// I/O error outside per-file isolation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested worker pool could not be built
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Manifest or report could not be serialized
    #[error("Failed to serialize {artifact}: {source}")]
    Serialize {
        /// Artifact being written
        artifact: &'static str,
        /// Underlying serialization error
        #[source]
        source: serde_json::Error,
    },
}
