//! Configuration file loading

use super::file::{ConfigFile, CONFIG_FILE_NAME};
use anyhow::{Context, Result};
use std::path::Path;

/// Handles loading the optional `.asset-slim.toml` at the asset root
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from .asset-slim.toml in the given directory.
    ///
    /// A missing file yields the built-in defaults; a present but invalid
    /// file is an error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use asset_slim::config::ConfigLoader;
    /// use std::path::Path;
    ///
    /// let config = ConfigLoader::load(Path::new("."))?;
    /// println!("{} critical assets", config.critical_assets.len());
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(asset_root: &Path) -> Result<ConfigFile> {
        let config_path = asset_root.join(CONFIG_FILE_NAME);

        let contents = match std::fs::read_to_string(&config_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ConfigFile::default());
            }
            Err(e) => {
                return Err(e).context("Failed to read .asset-slim.toml");
            }
        };

        let config: ConfigFile =
            toml_edit::de::from_str(&contents).context("Failed to parse .asset-slim.toml")?;
        config
            .validate()
            .context("Invalid .asset-slim.toml configuration")?;

        Ok(config)
    }
}
