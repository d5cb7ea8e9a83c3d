//! Pipeline configuration types

use crate::config::ConfigFile;
use std::path::PathBuf;

/// Runtime configuration for a pipeline run.
///
/// Built from the on-disk [`ConfigFile`] (or its defaults) plus CLI options.
/// The critical-asset list is injected here rather than derived anywhere in
/// the pipeline.
///
/// # Examples
///
/// ```
/// use asset_slim::pipeline::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.webp_quality, 85);
/// assert_eq!(config.jpeg_quality, 90);
/// assert_eq!((config.max_width, config.max_height), (800, 600));
/// assert_eq!(config.budget_bytes, 20 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Image directory relative to the asset root
    pub images_subpath: PathBuf,
    /// Structured-data directory relative to the asset root
    pub data_subpath: PathBuf,
    /// Images exempted from deletion/format change
    pub critical_assets: Vec<String>,
    /// WebP quality for converted non-critical images
    pub webp_quality: u8,
    /// JPEG quality for in-place critical re-encodes
    pub jpeg_quality: u8,
    /// Cover-fit box width in pixels
    pub max_width: u32,
    /// Cover-fit box height in pixels
    pub max_height: u32,
    /// Target maximum total on-disk size in bytes
    pub budget_bytes: u64,
    /// Remote host URL prefix for the manifest
    pub base_url: String,
    /// Fallback URL prefix for the manifest
    pub fallback_url: String,
    /// Client cache duration for the manifest
    pub cache_duration_hours: u32,
    /// Worker threads for the transform/compact phases; None uses the rayon default
    pub jobs: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_file(ConfigFile::default())
    }
}

impl PipelineConfig {
    /// Build a runtime config from a parsed configuration file
    pub fn from_file(file: ConfigFile) -> Self {
        Self {
            images_subpath: PathBuf::from(file.images_subpath),
            data_subpath: PathBuf::from(file.data_subpath),
            critical_assets: file.critical_assets,
            webp_quality: file.quality.webp,
            jpeg_quality: file.quality.jpeg,
            max_width: file.limits.max_width,
            max_height: file.limits.max_height,
            budget_bytes: file.limits.budget_mb * 1024 * 1024,
            base_url: file.remote.base_url,
            fallback_url: file.remote.fallback_url,
            cache_duration_hours: file.remote.cache_duration_hours,
            jobs: None,
        }
    }
}
