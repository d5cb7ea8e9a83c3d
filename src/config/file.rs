//! Configuration file data structures

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = ".asset-slim.toml";

/// asset-slim configuration file structure
///
/// All fields are optional in the file; defaults mirror the constants the
/// pipeline has always shipped with (WebP 85, JPEG 90, 800×600 box, 20 MB
/// budget, 24 h remote cache).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Images exempted from deletion/format change (re-encoded in place only)
    #[serde(rename = "critical-assets", default)]
    pub critical_assets: Vec<String>,

    /// Image directory, relative to the asset root
    #[serde(rename = "images-subpath", default = "default_images_subpath")]
    pub images_subpath: String,

    /// Structured-data directory, relative to the asset root
    #[serde(rename = "data-subpath", default = "default_data_subpath")]
    pub data_subpath: String,

    /// Encoding quality settings
    #[serde(default)]
    pub quality: QualitySettings,

    /// Size constraints
    #[serde(default)]
    pub limits: SizeLimits,

    /// Remote asset hosting settings
    #[serde(default)]
    pub remote: RemoteSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            critical_assets: Vec::new(),
            images_subpath: default_images_subpath(),
            data_subpath: default_data_subpath(),
            quality: QualitySettings::default(),
            limits: SizeLimits::default(),
            remote: RemoteSettings::default(),
        }
    }
}

fn default_images_subpath() -> String {
    "assets/imagens/bigsize".to_string()
}

fn default_data_subpath() -> String {
    "assets/database".to_string()
}

/// Encoding quality settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySettings {
    /// WebP quality for converted non-critical images (1-100)
    #[serde(default = "default_webp_quality")]
    pub webp: u8,

    /// JPEG quality for in-place re-encoded critical images (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg: u8,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            webp: default_webp_quality(),
            jpeg: default_jpeg_quality(),
        }
    }
}

fn default_webp_quality() -> u8 {
    85
}

fn default_jpeg_quality() -> u8 {
    90
}

/// Size constraints for images and the overall budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeLimits {
    /// Maximum image width in pixels; larger images are cover-fit resized
    #[serde(rename = "max-width", default = "default_max_width")]
    pub max_width: u32,

    /// Maximum image height in pixels
    #[serde(rename = "max-height", default = "default_max_height")]
    pub max_height: u32,

    /// Target maximum total on-disk size in MB
    #[serde(rename = "budget-mb", default = "default_budget_mb")]
    pub budget_mb: u64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
            budget_mb: default_budget_mb(),
        }
    }
}

fn default_max_width() -> u32 {
    800
}

fn default_max_height() -> u32 {
    600
}

fn default_budget_mb() -> u64 {
    20
}

/// Remote asset hosting settings, emitted verbatim into the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// URL prefix the remote host serves assets from
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// URL prefix clients fall back to on a miss
    #[serde(rename = "fallback-url", default = "default_fallback_url")]
    pub fallback_url: String,

    /// How long clients may cache a fetched asset
    #[serde(rename = "cache-duration-hours", default = "default_cache_duration")]
    pub cache_duration_hours: u32,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            fallback_url: default_fallback_url(),
            cache_duration_hours: default_cache_duration(),
        }
    }
}

fn default_base_url() -> String {
    "https://assets.example.com/images/".to_string()
}

fn default_fallback_url() -> String {
    "https://backup.example.com/images/".to_string()
}

fn default_cache_duration() -> u32 {
    24
}

impl ConfigFile {
    /// Validate quality and dimension constraints
    pub fn validate(&self) -> Result<()> {
        for (name, q) in [("webp", self.quality.webp), ("jpeg", self.quality.jpeg)] {
            if q == 0 || q > 100 {
                anyhow::bail!("{} quality must be within 1-100, got {}", name, q);
            }
        }
        if self.limits.max_width == 0 || self.limits.max_height == 0 {
            anyhow::bail!(
                "image box must be non-empty, got {}x{}",
                self.limits.max_width,
                self.limits.max_height
            );
        }
        if self.limits.budget_mb == 0 {
            anyhow::bail!("budget-mb must be greater than zero");
        }
        Ok(())
    }
}
