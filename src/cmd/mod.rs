//! Command handlers for the asset-slim CLI
//!
//! Thin presentation layers over the pipeline. Business logic lives in
//! [`crate::pipeline`]; these modules format and display results.

pub mod completions;
pub mod optimize;

pub use completions::cmd_completions;
pub use optimize::cmd_optimize;
