//! The optimization pipeline: configuration, shared state, orchestration

mod cancel;
mod config;
mod error;
pub mod orchestrator;
mod stats;

pub use cancel::CancellationToken;
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use orchestrator::{backup_root, Orchestrator, PipelineSummary, SkippedFile, BACKUP_DIR_NAME};
pub use stats::{OptimizationStats, StatsSnapshot};
