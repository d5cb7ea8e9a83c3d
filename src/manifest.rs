//! Remote-asset manifest: which assets a remote host is expected to serve.
//!
//! Built once, after transformation, from a fresh inventory. Entries are
//! sorted by name so the manifest is byte-identical across runs on
//! unchanged input, which keeps diffs reviewable and builds reproducible.
//!
//! The invariant enforced here: no critical asset ever appears in
//! `assets`. Clients fetch `base_url + remote_path` and fall back to
//! `fallback_url` on a miss; critical assets stay bundled locally.

use crate::inventory::AssetRecord;
use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Manifest file name, written at the asset root
pub const MANIFEST_FILE_NAME: &str = "remote_assets_config.json";

/// Manifest format version
const MANIFEST_VERSION: &str = "1.0";

/// One remote-eligible asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Bundled path relative to the images directory, slash-separated.
    /// Same-named files in different subdirectories stay distinct.
    pub local_name: String,
    /// Path under `base_url` on the remote host; mirrors the local layout
    pub remote_path: String,
    /// Byte size after transformation
    pub size: u64,
    /// Format after transformation, e.g. "webp"
    pub format: String,
}

/// Versioned description of the remote-asset layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteManifest {
    /// Manifest format version
    pub version: String,
    /// URL prefix the remote host serves assets from
    pub base_url: String,
    /// URL prefix clients fall back to on a miss
    pub fallback_url: String,
    /// How long clients may cache a fetched asset
    pub cache_duration_hours: u32,
    /// Assets that must stay bundled locally, sorted
    pub critical_local_assets: Vec<String>,
    /// Remote-eligible assets, sorted by local name
    pub assets: Vec<ManifestEntry>,
}

/// Builds the manifest from the post-transformation image inventory
pub struct ManifestBuilder;

impl ManifestBuilder {
    /// Build a deterministic manifest.
    ///
    /// Every non-critical image present after transformation gets an
    /// entry; critical names are listed separately and never both. Entries
    /// are keyed by path relative to the images directory, so nested files
    /// sharing a basename never collapse into one entry.
    pub fn build(images: &[AssetRecord], config: &PipelineConfig) -> RemoteManifest {
        let critical: BTreeSet<String> = config.critical_assets.iter().cloned().collect();

        let mut assets: Vec<ManifestEntry> = images
            .iter()
            .filter(|record| !critical.contains(&record.name()))
            .map(|record| {
                let key = relative_key(record, &config.images_subpath);
                ManifestEntry {
                    local_name: key.clone(),
                    remote_path: key,
                    size: record.size,
                    format: record.format.clone(),
                }
            })
            .collect();
        assets.sort_by(|a, b| a.local_name.cmp(&b.local_name));

        RemoteManifest {
            version: MANIFEST_VERSION.to_string(),
            base_url: config.base_url.clone(),
            fallback_url: config.fallback_url.clone(),
            cache_duration_hours: config.cache_duration_hours,
            critical_local_assets: critical.into_iter().collect(),
            assets,
        }
    }
}

impl RemoteManifest {
    /// Serialize to the on-disk JSON form
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

/// Record path relative to the images directory, joined with forward
/// slashes regardless of platform.
fn relative_key(record: &AssetRecord, images_subpath: &Path) -> String {
    let rel = record
        .rel_path
        .strip_prefix(images_subpath)
        .unwrap_or(&record.rel_path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::AssetKind;
    use std::path::PathBuf;

    fn image(name: &str, size: u64, format: &str) -> AssetRecord {
        AssetRecord {
            rel_path: PathBuf::from(format!("assets/imagens/bigsize/{name}")),
            abs_path: PathBuf::from(format!("/tmp/assets/imagens/bigsize/{name}")),
            size,
            format: format.to_string(),
            dimensions: Some((800, 600)),
            kind: AssetKind::Image,
            critical: false,
        }
    }

    fn config_with_critical(names: &[&str]) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.critical_assets = names.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn test_critical_assets_are_excluded_from_assets_list() {
        let images = vec![image("a.jpg", 100, "jpg"), image("b.webp", 50, "webp")];
        let manifest = ManifestBuilder::build(&images, &config_with_critical(&["a.jpg"]));

        assert_eq!(manifest.assets.len(), 1);
        assert_eq!(manifest.assets[0].local_name, "b.webp");
        assert_eq!(manifest.critical_local_assets, vec!["a.jpg"]);
    }

    #[test]
    fn test_no_asset_name_intersects_critical_list() {
        let images = vec![
            image("a.webp", 1, "webp"),
            image("b.webp", 2, "webp"),
            image("c.webp", 3, "webp"),
        ];
        let manifest = ManifestBuilder::build(&images, &config_with_critical(&["b.webp"]));

        for entry in &manifest.assets {
            assert!(!manifest.critical_local_assets.contains(&entry.local_name));
        }
    }

    #[test]
    fn test_same_basename_in_subdirectories_stays_distinct() {
        let mut first = image("logo.webp", 10, "webp");
        first.rel_path = PathBuf::from("assets/imagens/bigsize/icons/logo.webp");
        let mut second = image("logo.webp", 20, "webp");
        second.rel_path = PathBuf::from("assets/imagens/bigsize/splash/logo.webp");

        let manifest = ManifestBuilder::build(&[first, second], &PipelineConfig::default());

        assert_eq!(manifest.assets.len(), 2);
        assert_eq!(manifest.assets[0].local_name, "icons/logo.webp");
        assert_eq!(manifest.assets[1].local_name, "splash/logo.webp");
        assert_eq!(manifest.assets[0].size, 10);
        assert_eq!(manifest.assets[1].size, 20);
    }

    #[test]
    fn test_entries_sorted_regardless_of_input_order() {
        let images = vec![
            image("zz.webp", 1, "webp"),
            image("aa.webp", 2, "webp"),
            image("mm.webp", 3, "webp"),
        ];
        let manifest = ManifestBuilder::build(&images, &PipelineConfig::default());

        let names: Vec<_> = manifest.assets.iter().map(|e| e.local_name.as_str()).collect();
        assert_eq!(names, vec!["aa.webp", "mm.webp", "zz.webp"]);
    }

    #[test]
    fn test_identical_input_produces_identical_bytes() {
        let images = vec![image("x.webp", 10, "webp"), image("y.webp", 20, "webp")];
        let config = PipelineConfig::default();

        let first = ManifestBuilder::build(&images, &config).to_json().unwrap();
        let second = ManifestBuilder::build(&images, &config).to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_manifest_carries_remote_settings() {
        let mut config = PipelineConfig::default();
        config.base_url = "https://cdn.example.com/img/".to_string();
        config.fallback_url = "https://backup.example.com/img/".to_string();
        config.cache_duration_hours = 48;

        let manifest = ManifestBuilder::build(&[], &config);
        assert_eq!(manifest.version, "1.0");
        assert_eq!(manifest.base_url, "https://cdn.example.com/img/");
        assert_eq!(manifest.fallback_url, "https://backup.example.com/img/");
        assert_eq!(manifest.cache_duration_hours, 48);
        assert!(manifest.assets.is_empty());
    }

    #[test]
    fn test_json_shape_matches_consumers() {
        let images = vec![image("a.webp", 123, "webp")];
        let manifest = ManifestBuilder::build(&images, &PipelineConfig::default());
        let value: serde_json::Value =
            serde_json::from_slice(&manifest.to_json().unwrap()).unwrap();

        assert!(value.get("version").is_some());
        assert!(value.get("base_url").is_some());
        assert!(value.get("fallback_url").is_some());
        assert!(value.get("cache_duration_hours").is_some());
        assert!(value.get("critical_local_assets").is_some());
        let entry = &value["assets"][0];
        assert_eq!(entry["local_name"], "a.webp");
        assert_eq!(entry["remote_path"], "a.webp");
        assert_eq!(entry["size"], 123);
        assert_eq!(entry["format"], "webp");
    }
}
