//! Configuration file handling for asset-slim
//!
//! The asset root may carry an optional `.asset-slim.toml` supplying the
//! critical-asset allow-list, encoding qualities, the resize box, the size
//! budget, and remote hosting URLs. Missing file means built-in defaults.

pub mod file;
pub mod loader;

pub use file::{ConfigFile, QualitySettings, RemoteSettings, SizeLimits, CONFIG_FILE_NAME};
pub use loader::ConfigLoader;
