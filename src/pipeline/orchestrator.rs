//! Pipeline orchestration: phase ordering and failure isolation.
//!
//! Phases run strictly in order: inventory, backup, parallel transform and
//! compact, manifest, report. The backup phase is fatal on failure because
//! everything after it is destructive. Inside the parallel phase each file
//! is an isolated work item; a failed item becomes a skipped outcome in the
//! summary and the run continues.

use crate::inventory::{AssetInventory, AssetRecord};
use crate::manifest::{ManifestBuilder, RemoteManifest, MANIFEST_FILE_NAME};
use crate::optimizer::{BackupManager, BackupStatus, DataCompactor, FileOutcome, ImageTransformer};
use crate::pipeline::{CancellationToken, OptimizationStats, PipelineConfig, PipelineError, StatsSnapshot};
use crate::report::{Report, ReportGenerator, REPORT_FILE_NAME};
use crate::store::{AssetStore, RealAssetStore};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Backup directory created next to the asset subtrees, inside the root
pub const BACKUP_DIR_NAME: &str = "assets_backup";

/// A file the parallel phase gave up on, with the reason
#[derive(Debug, Clone)]
pub struct SkippedFile {
    /// File name relative to its subtree
    pub name: String,
    /// Why it was left untouched
    pub reason: String,
}

/// What a completed (or interrupted) run produced
#[derive(Debug)]
pub struct PipelineSummary {
    /// Whether a backup was created or an existing one reused
    pub backup: BackupStatus,
    /// Images found at inventory time
    pub images_found: usize,
    /// Structured-data files found at inventory time
    pub data_files_found: usize,
    /// Counter snapshot taken after the parallel phase
    pub stats: StatsSnapshot,
    /// Files skipped by per-file isolation
    pub skipped: Vec<SkippedFile>,
    /// Manifest written for remote hosting, absent when interrupted
    pub manifest: Option<RemoteManifest>,
    /// Final report, absent when interrupted
    pub report: Option<Report>,
    /// True when cancellation stopped the run before the artifacts phase
    pub interrupted: bool,
}

/// Runs the whole pipeline over one asset root
pub struct Orchestrator<S: AssetStore + Clone + Sync = RealAssetStore> {
    root: PathBuf,
    config: PipelineConfig,
    store: S,
}

impl Orchestrator<RealAssetStore> {
    /// Create an orchestrator over the real filesystem
    pub fn new(root: impl Into<PathBuf>, config: PipelineConfig) -> Self {
        Self::with_store(root, config, RealAssetStore)
    }
}

impl<S: AssetStore + Clone + Sync> Orchestrator<S> {
    /// Create an orchestrator with a custom store implementation
    pub fn with_store(root: impl Into<PathBuf>, config: PipelineConfig, store: S) -> Self {
        Self {
            root: root.into(),
            config,
            store,
        }
    }

    /// Run the pipeline to completion or until cancelled.
    ///
    /// Cancellation is observed between work items, never mid-file, so an
    /// interrupted run leaves every touched file in a consistent state. An
    /// interrupted run skips the manifest and report phases entirely.
    pub fn run(&self, cancel: &CancellationToken) -> Result<PipelineSummary, PipelineError> {
        if !self.store.exists(&self.root) {
            return Err(PipelineError::RootNotFound(self.root.clone()));
        }

        let inventory = self.inventory().scan()?;
        log::info!(
            "inventory: {} images, {} data files, {} bytes",
            inventory.images.len(),
            inventory.data_files.len(),
            inventory.total_bytes
        );

        let stats = OptimizationStats::default();
        stats.set_bytes_before(inventory.total_bytes);

        let backup = BackupManager::with_store(self.store.clone()).ensure_backup(
            &self.root,
            &self.root.join(BACKUP_DIR_NAME),
            &[
                self.config.images_subpath.clone(),
                self.config.data_subpath.clone(),
            ],
        )?;

        let (images, mut skipped) = split_destination_conflicts(inventory.images.clone());

        let outcomes = self.transform_phase(&images, &inventory.data_files, &stats, cancel)?;
        skipped.extend(outcomes.iter().filter_map(|o| {
            o.skip_reason().map(|reason| SkippedFile {
                name: o.name().to_string(),
                reason: reason.to_string(),
            })
        }));

        let mut summary = PipelineSummary {
            backup,
            images_found: inventory.images.len(),
            data_files_found: inventory.data_files.len(),
            stats: stats.snapshot(),
            skipped,
            manifest: None,
            report: None,
            interrupted: cancel.is_cancelled(),
        };
        if summary.interrupted {
            log::warn!("run interrupted, manifest and report not written");
            return Ok(summary);
        }

        // The transform phase renamed and deleted files, so the manifest is
        // built from a fresh scan rather than the pre-transform records.
        let survivors = self.inventory().scan()?;
        summary.manifest = Some(self.write_manifest(&survivors.images)?);
        summary.report = Some(self.write_report(&summary.stats)?);

        Ok(summary)
    }

    fn inventory(&self) -> AssetInventory<S> {
        AssetInventory::with_store(
            &self.root,
            &self.config.images_subpath,
            &self.config.data_subpath,
            self.config.critical_assets.iter().cloned(),
            self.store.clone(),
        )
    }

    /// Process images and data files in parallel, one outcome per file
    /// actually attempted. Items not yet started when cancellation hits are
    /// dropped without an outcome.
    fn transform_phase(
        &self,
        images: &[AssetRecord],
        data_files: &[AssetRecord],
        stats: &OptimizationStats,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileOutcome>, PipelineError> {
        let transformer = ImageTransformer::with_store(&self.config, self.store.clone());
        let compactor = DataCompactor::with_store(self.store.clone());

        let work = || {
            let (mut image_outcomes, mut data_outcomes): (Vec<_>, Vec<_>) = rayon::join(
                || {
                    images
                        .par_iter()
                        .filter(|_| !cancel.is_cancelled())
                        .map(|record| transformer.process(record, stats))
                        .collect()
                },
                || {
                    data_files
                        .par_iter()
                        .filter(|_| !cancel.is_cancelled())
                        .map(|record| compactor.process(record, stats))
                        .collect()
                },
            );
            image_outcomes.append(&mut data_outcomes);
            image_outcomes
        };

        match self.config.jobs {
            Some(jobs) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
                Ok(pool.install(work))
            }
            None => Ok(work()),
        }
    }

    fn write_manifest(&self, images: &[crate::inventory::AssetRecord]) -> Result<RemoteManifest, PipelineError> {
        let manifest = ManifestBuilder::build(images, &self.config);
        let bytes = manifest
            .to_json()
            .map_err(|source| PipelineError::Serialize {
                artifact: "manifest",
                source,
            })?;
        self.store
            .write_atomic(&self.root.join(MANIFEST_FILE_NAME), &bytes)?;
        Ok(manifest)
    }

    fn write_report(&self, snapshot: &StatsSnapshot) -> Result<Report, PipelineError> {
        let generator =
            ReportGenerator::with_store(&self.root, &self.config, self.store.clone());
        let report = generator.generate(snapshot)?;
        let bytes =
            serde_json::to_vec_pretty(&report).map_err(|source| PipelineError::Serialize {
                artifact: "report",
                source,
            })?;
        self.store
            .write_atomic(&self.root.join(REPORT_FILE_NAME), &bytes)?;
        Ok(report)
    }
}

/// Resolve the backup directory path for an asset root
pub fn backup_root(asset_root: &Path) -> PathBuf {
    asset_root.join(BACKUP_DIR_NAME)
}

/// The path a record's transformed bytes will land at. Non-critical images
/// move to `<stem>.webp`; everything else is rewritten in place.
fn transform_destination(record: &AssetRecord) -> PathBuf {
    if record.critical || record.format == "webp" {
        record.abs_path.clone()
    } else {
        record.abs_path.with_extension("webp")
    }
}

/// Withhold images whose destination is claimed by another record.
///
/// Sources sharing a stem (`photo.jpg` and `photo.png`) both resolve to
/// `photo.webp`; letting both convert would overwrite one result and delete
/// both originals, losing an asset outright. In-place records keep running
/// since their destination is their own path; every other claimant of a
/// contested destination is skipped with its files untouched.
fn split_destination_conflicts(images: Vec<AssetRecord>) -> (Vec<AssetRecord>, Vec<SkippedFile>) {
    let mut claims: HashMap<PathBuf, u32> = HashMap::new();
    for record in &images {
        *claims.entry(transform_destination(record)).or_insert(0) += 1;
    }

    let mut kept = Vec::with_capacity(images.len());
    let mut skipped = Vec::new();
    for record in images {
        let dest = transform_destination(&record);
        if claims[&dest] > 1 && dest != record.abs_path {
            let name = record.name();
            log::warn!("skipping image {name}: destination {} is contested", dest.display());
            skipped.push(SkippedFile {
                name,
                reason: format!(
                    "webp destination {} is claimed by another asset",
                    dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
                ),
            });
        } else {
            kept.push(record);
        }
    }
    (kept, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    fn seed_root(root: &Path) {
        let images = root.join("assets/imagens/bigsize");
        let data = root.join("assets/database");
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&data).unwrap();
        fs::write(images.join("photo.jpg"), jpeg_bytes(1000, 750)).unwrap();
        image::RgbImage::from_pixel(64, 48, Rgb([9, 9, 9]))
            .save(images.join("logo.png"))
            .unwrap();
        fs::write(data.join("db.json"), b"{\"a\": 1,  \"b\": [1, 2, 3]}").unwrap();
    }

    fn run(root: &Path, config: PipelineConfig) -> PipelineSummary {
        Orchestrator::new(root, config)
            .run(&CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let result = Orchestrator::new("/nonexistent/root", PipelineConfig::default())
            .run(&CancellationToken::new());
        assert!(matches!(result, Err(PipelineError::RootNotFound(_))));
    }

    #[test]
    fn test_full_run_produces_all_artifacts() {
        let temp = TempDir::new().unwrap();
        seed_root(temp.path());

        let summary = run(temp.path(), PipelineConfig::default());

        assert_eq!(summary.backup, BackupStatus::Created);
        assert_eq!(summary.images_found, 2);
        assert_eq!(summary.data_files_found, 1);
        assert!(!summary.interrupted);
        assert!(summary.skipped.is_empty());
        assert!(summary.manifest.is_some());
        assert!(summary.report.is_some());

        assert!(temp.path().join(BACKUP_DIR_NAME).exists());
        assert!(temp.path().join(MANIFEST_FILE_NAME).exists());
        assert!(temp.path().join(REPORT_FILE_NAME).exists());

        // Originals converted, backup preserved untouched.
        let images = temp.path().join("assets/imagens/bigsize");
        assert!(!images.join("photo.jpg").exists());
        assert!(images.join("photo.webp").exists());
        assert!(temp
            .path()
            .join(BACKUP_DIR_NAME)
            .join("assets/imagens/bigsize/photo.jpg")
            .exists());
    }

    #[test]
    fn test_backup_precedes_transformation() {
        let temp = TempDir::new().unwrap();
        seed_root(temp.path());
        let original = fs::read(temp.path().join("assets/imagens/bigsize/photo.jpg")).unwrap();

        run(temp.path(), PipelineConfig::default());

        let backed_up = fs::read(
            temp.path()
                .join(BACKUP_DIR_NAME)
                .join("assets/imagens/bigsize/photo.jpg"),
        )
        .unwrap();
        assert_eq!(backed_up, original);
    }

    #[test]
    fn test_second_run_reuses_backup_and_converges() {
        let temp = TempDir::new().unwrap();
        seed_root(temp.path());

        let first = run(temp.path(), PipelineConfig::default());
        assert_eq!(first.backup, BackupStatus::Created);

        let second = run(temp.path(), PipelineConfig::default());
        assert_eq!(second.backup, BackupStatus::AlreadyExists);
        // Everything is already WebP and minified; nothing converts again.
        assert_eq!(second.stats.webp_converted, 0);
        assert_eq!(second.stats.data_files_compacted, 0);
    }

    #[test]
    fn test_critical_asset_keeps_name_and_appears_in_manifest_exclusions() {
        let temp = TempDir::new().unwrap();
        seed_root(temp.path());

        let mut config = PipelineConfig::default();
        config.critical_assets = vec!["logo.png".to_string()];
        let summary = run(temp.path(), config);

        assert!(temp
            .path()
            .join("assets/imagens/bigsize/logo.png")
            .exists());
        let manifest = summary.manifest.unwrap();
        assert_eq!(manifest.critical_local_assets, vec!["logo.png"]);
        assert!(manifest.assets.iter().all(|a| a.local_name != "logo.png"));
    }

    #[test]
    fn test_same_stem_sources_are_withheld_not_overwritten() {
        let temp = TempDir::new().unwrap();
        let images = temp.path().join("assets/imagens/bigsize");
        fs::create_dir_all(&images).unwrap();
        fs::write(images.join("photo.jpg"), jpeg_bytes(100, 80)).unwrap();
        image::RgbImage::from_pixel(50, 40, Rgb([1, 2, 3]))
            .save(images.join("photo.png"))
            .unwrap();

        let summary = run(temp.path(), PipelineConfig::default());

        // Both sources claim photo.webp; converting either would destroy
        // the other's content, so neither is touched.
        assert!(images.join("photo.jpg").exists());
        assert!(images.join("photo.png").exists());
        assert!(!images.join("photo.webp").exists());
        assert_eq!(summary.stats.webp_converted, 0);
        assert_eq!(summary.skipped.len(), 2);
        for skip in &summary.skipped {
            assert!(skip.reason.contains("photo.webp"), "reason: {}", skip.reason);
        }
    }

    #[test]
    fn test_existing_webp_is_not_overwritten_by_same_stem_source() {
        let temp = TempDir::new().unwrap();
        let images = temp.path().join("assets/imagens/bigsize");
        fs::create_dir_all(&images).unwrap();
        fs::write(images.join("photo.jpg"), jpeg_bytes(100, 80)).unwrap();
        let img = image::RgbImage::from_pixel(30, 30, Rgb([4, 5, 6]));
        let encoded = webp::Encoder::from_rgb(img.as_raw(), 30, 30).encode(90.0);
        fs::write(images.join("photo.webp"), &*encoded).unwrap();
        let webp_before = fs::read(images.join("photo.webp")).unwrap();

        let summary = run(temp.path(), PipelineConfig::default());

        assert_eq!(fs::read(images.join("photo.webp")).unwrap(), webp_before);
        assert!(images.join("photo.jpg").exists());
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].name, "photo.jpg");
    }

    #[test]
    fn test_corrupt_file_is_skipped_not_fatal() {
        let temp = TempDir::new().unwrap();
        seed_root(temp.path());
        fs::write(
            temp.path().join("assets/imagens/bigsize/broken.jpg"),
            b"not an image",
        )
        .unwrap();

        let summary = run(temp.path(), PipelineConfig::default());
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].name, "broken.jpg");
        // The rest of the run still completed.
        assert!(summary.report.is_some());
        assert!(temp
            .path()
            .join("assets/imagens/bigsize/broken.jpg")
            .exists());
    }

    #[test]
    fn test_cancelled_run_skips_artifacts() {
        let temp = TempDir::new().unwrap();
        seed_root(temp.path());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = Orchestrator::new(temp.path(), PipelineConfig::default())
            .run(&cancel)
            .unwrap();

        assert!(summary.interrupted);
        assert!(summary.manifest.is_none());
        assert!(summary.report.is_none());
        assert!(!temp.path().join(MANIFEST_FILE_NAME).exists());
        assert!(!temp.path().join(REPORT_FILE_NAME).exists());
        // Backup still ran; cancellation is observed between work items.
        assert!(temp.path().join(BACKUP_DIR_NAME).exists());
    }

    #[test]
    fn test_explicit_jobs_runs_to_completion() {
        let temp = TempDir::new().unwrap();
        seed_root(temp.path());

        let mut config = PipelineConfig::default();
        config.jobs = Some(2);
        let summary = run(temp.path(), config);
        assert_eq!(summary.stats.images_processed, 2);
    }

    #[test]
    fn test_report_reflects_on_disk_truth() {
        let temp = TempDir::new().unwrap();
        seed_root(temp.path());

        let summary = run(temp.path(), PipelineConfig::default());
        let report = summary.report.unwrap();

        let mut on_disk = 0;
        for sub in ["assets/imagens/bigsize", "assets/database"] {
            for entry in walkdir(&temp.path().join(sub)) {
                on_disk += fs::metadata(entry).unwrap().len();
            }
        }
        assert_eq!(report.stats.optimized_size, on_disk);
        assert!(report.target_achieved);
    }

    fn walkdir(dir: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                out.extend(walkdir(&path));
            } else {
                out.push(path);
            }
        }
        out
    }
}
