//! Per-image transformation: decode, normalize, cover-fit resize, re-encode.
//!
//! Non-critical images become WebP under a new name; the original is
//! deleted only after the new file is durably written, so the asset always
//! exists in exactly one form. Critical images are re-encoded in place in
//! their own format and are never deleted. One bad file never aborts the
//! run.

use crate::fmt::{format_bytes, reduction_percent};
use crate::inventory::AssetRecord;
use crate::optimizer::FileOutcome;
use crate::pipeline::{OptimizationStats, PipelineConfig};
use crate::store::{AssetStore, RealAssetStore};
use console::style;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::io::Cursor;
use std::path::PathBuf;

/// Decoder resource caps; a corrupt or hostile input hits these instead of
/// stalling a worker or exhausting memory.
const MAX_DECODE_DIM: u32 = 20_000;
const MAX_DECODE_ALLOC: u64 = 256 * 1024 * 1024;

/// Reductions below this are not worth a console line
const REPORT_THRESHOLD_PERCENT: f64 = 10.0;

/// Transforms one image per work item
pub struct ImageTransformer<S: AssetStore = RealAssetStore> {
    webp_quality: u8,
    jpeg_quality: u8,
    max_width: u32,
    max_height: u32,
    store: S,
}

impl ImageTransformer<RealAssetStore> {
    /// Create a transformer over the real filesystem
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_store(config, RealAssetStore)
    }
}

impl<S: AssetStore> ImageTransformer<S> {
    /// Create a transformer with a custom store implementation
    pub fn with_store(config: &PipelineConfig, store: S) -> Self {
        Self {
            webp_quality: config.webp_quality,
            jpeg_quality: config.jpeg_quality,
            max_width: config.max_width,
            max_height: config.max_height,
            store,
        }
    }

    /// Process a single image record.
    ///
    /// Decode failures and encode failures are recorded as a skip; the file
    /// on disk is left exactly as it was.
    pub fn process(&self, record: &AssetRecord, stats: &OptimizationStats) -> FileOutcome {
        let name = record.name();

        // Header-probed dimensions settle already-WebP files without a
        // decode: in the box means nothing would change.
        if !record.critical && record.format == "webp" {
            if let Some((width, height)) = record.dimensions {
                if width <= self.max_width && height <= self.max_height {
                    return FileOutcome::Unchanged { name };
                }
            }
        }

        let bytes = match self.store.read(&record.abs_path) {
            Ok(b) => b,
            Err(e) => return self.skip(name, format!("read failed: {e}")),
        };

        let decoded = match self.decode(bytes) {
            Ok(img) => img,
            Err(reason) => return self.skip(name, format!("decode failed: {reason}")),
        };

        // Collapse alpha/palette modes to flat RGB, encodable by both
        // target formats.
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut resized = false;
        let rgb = if width > self.max_width || height > self.max_height {
            resized = true;
            DynamicImage::ImageRgb8(rgb)
                .resize_to_fill(self.max_width, self.max_height, FilterType::Lanczos3)
                .to_rgb8()
        } else {
            rgb
        };

        // Already WebP and within the box: a lossy re-encode would change
        // bytes on every run without gaining anything, so leave it alone.
        if !record.critical && record.format == "webp" && !resized {
            return FileOutcome::Unchanged { name };
        }

        let outcome = if record.critical {
            self.reencode_in_place(record, &name, rgb)
        } else {
            self.convert_to_webp(record, &name, rgb)
        };

        match &outcome {
            FileOutcome::Converted { before, after, .. } => {
                stats.record_image(*after, true, resized);
                self.report_reduction(&name, *before, *after);
            }
            FileOutcome::Reencoded { before, after, .. } => {
                stats.record_image(*after, false, resized);
                self.report_reduction(&name, *before, *after);
            }
            _ => {}
        }
        outcome
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<DynamicImage, String> {
        let mut reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| e.to_string())?;

        let mut limits = image::Limits::default();
        limits.max_image_width = Some(MAX_DECODE_DIM);
        limits.max_image_height = Some(MAX_DECODE_DIM);
        limits.max_alloc = Some(MAX_DECODE_ALLOC);
        reader.limits(limits);

        reader.decode().map_err(|e| e.to_string())
    }

    /// Critical path: same filename, same format, high quality.
    fn reencode_in_place(&self, record: &AssetRecord, name: &str, rgb: RgbImage) -> FileOutcome {
        let encoded = match self.encode_as(&record.format, &rgb) {
            Ok(bytes) => bytes,
            Err(reason) => return self.skip(name.to_string(), reason),
        };

        if let Err(e) = self.store.write_atomic(&record.abs_path, &encoded) {
            return self.skip(name.to_string(), format!("write failed: {e}"));
        }

        FileOutcome::Reencoded {
            name: name.to_string(),
            before: record.size,
            after: encoded.len() as u64,
        }
    }

    /// Non-critical path: WebP under the new extension, then delete the
    /// original. Delete strictly after the write succeeds, so a crash in
    /// between leaves both files rather than neither.
    fn convert_to_webp(&self, record: &AssetRecord, name: &str, rgb: RgbImage) -> FileOutcome {
        let (width, height) = rgb.dimensions();
        let encoded = webp::Encoder::from_rgb(rgb.as_raw(), width, height)
            .encode(self.webp_quality as f32);

        let dest: PathBuf = record.abs_path.with_extension("webp");
        if let Err(e) = self.store.write_atomic(&dest, &encoded) {
            return self.skip(name.to_string(), format!("write failed: {e}"));
        }

        let format_changed = dest != record.abs_path;
        if format_changed {
            if let Err(e) = self.store.delete(&record.abs_path) {
                return self.skip(name.to_string(), format!("delete of original failed: {e}"));
            }
        }

        if format_changed {
            FileOutcome::Converted {
                name: name.to_string(),
                before: record.size,
                after: encoded.len() as u64,
            }
        } else {
            // Was already WebP; re-encoded in place, nothing to delete.
            FileOutcome::Reencoded {
                name: name.to_string(),
                before: record.size,
                after: encoded.len() as u64,
            }
        }
    }

    fn encode_as(&self, format: &str, rgb: &RgbImage) -> Result<Vec<u8>, String> {
        match format {
            "jpg" | "jpeg" => {
                let mut out = Vec::new();
                let mut encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
                encoder.encode_image(rgb).map_err(|e| e.to_string())?;
                Ok(out)
            }
            "png" => {
                let mut out = Cursor::new(Vec::new());
                rgb.write_to(&mut out, image::ImageFormat::Png)
                    .map_err(|e| e.to_string())?;
                Ok(out.into_inner())
            }
            "webp" => {
                let (width, height) = rgb.dimensions();
                Ok(webp::Encoder::from_rgb(rgb.as_raw(), width, height)
                    .encode(self.jpeg_quality as f32)
                    .to_vec())
            }
            other => Err(format!("unsupported critical image format: {other}")),
        }
    }

    fn report_reduction(&self, name: &str, before: u64, after: u64) {
        let reduction = reduction_percent(before, after);
        if reduction > REPORT_THRESHOLD_PERCENT {
            println!(
                "    {} {}: {} → {} (-{:.1}%)",
                style("✓").green(),
                name,
                format_bytes(before),
                format_bytes(after),
                reduction
            );
        }
    }

    fn skip(&self, name: impl Into<String>, reason: String) -> FileOutcome {
        let name = name.into();
        log::warn!("skipping image {name}: {reason}");
        FileOutcome::Skipped { name, reason }
    }
}
