#![warn(missing_docs)]
#![warn(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! asset-slim library
//!
//! Core functionality for shrinking a mobile app's bundled assets below a
//! size budget: images are resized and converted to WebP, JSON data files
//! are minified, a manifest marks non-critical images for remote hosting,
//! and the run ends with a machine-readable report. The library can be used
//! programmatically in addition to the CLI interface.
//!
//! # Basic Example
//!
//! Running the pipeline over an asset root:
//!
//! ```no_run
//! use asset_slim::pipeline::{CancellationToken, Orchestrator, PipelineConfig};
//!
//! let orchestrator = Orchestrator::new("app", PipelineConfig::default());
//! let summary = orchestrator.run(&CancellationToken::new())?;
//!
//! if let Some(report) = summary.report {
//!     println!("final size: {} MB", report.final_size_mb);
//! }
//! # Ok::<(), asset_slim::pipeline::PipelineError>(())
//! ```
//!
//! # Advanced Example: Custom Configuration
//!
//! Protecting assets from deletion and tightening the budget:
//!
//! ```
//! use asset_slim::pipeline::PipelineConfig;
//!
//! let mut config = PipelineConfig::default();
//! config.critical_assets = vec!["logo.png".to_string()];
//! config.budget_bytes = 10 * 1024 * 1024;
//!
//! assert_eq!(config.webp_quality, 85);
//! ```

pub mod cmd;
pub mod config;
pub mod error;
pub mod fmt;
pub mod inventory;
pub mod manifest;
pub mod optimizer;
pub mod pipeline;
pub mod report;
pub mod store;
