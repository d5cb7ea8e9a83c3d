//! Optimize command implementation
//!
//! Thin presentation layer for the default command. Phase ordering and all
//! file handling live in [`crate::pipeline::Orchestrator`].

use anyhow::{Context, Result};
use console::style;
use std::env;
use std::path::Path;

use crate::config::{ConfigLoader, CONFIG_FILE_NAME};
use crate::error::AssetSlimError;
use crate::fmt::{
    format_bytes, CAMERA, CHART, CHECKMARK, CLOUD, FLOPPY, FOLDER, PAGE, ROCKET, TARGET, WARNING,
};
use crate::optimizer::BackupStatus;
use crate::pipeline::{CancellationToken, Orchestrator, PipelineConfig, PipelineSummary};
use crate::report::Report;

/// Main optimize command handler (presentation layer)
///
/// Loads configuration from the asset root, wires the interrupt handler,
/// runs the pipeline, and renders the summary.
///
/// # Examples
///
/// ```no_run
/// use asset_slim::cmd::cmd_optimize;
/// use std::path::Path;
///
/// cmd_optimize(Some(Path::new("app")), false, None)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn cmd_optimize(root: Option<&Path>, json_output: bool, jobs: Option<usize>) -> Result<()> {
    let root = match root {
        Some(r) => r.to_path_buf(),
        None => env::current_dir()?,
    };

    println!(
        "{} {} asset optimization",
        ROCKET,
        style("asset-slim").bold()
    );
    println!("{} Directory: {}", FOLDER, root.display());

    let config_file = ConfigLoader::load(&root).map_err(|e| AssetSlimError::ConfigInvalid {
        path: root.join(CONFIG_FILE_NAME),
        message: format!("{e:#}"),
    })?;
    let mut config = PipelineConfig::from_file(config_file);
    config.jobs = jobs;
    let budget_bytes = config.budget_bytes;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())
            .context("failed to install interrupt handler")?;
    }

    let summary = Orchestrator::new(&root, config)
        .run(&cancel)
        .map_err(AssetSlimError::from)?;

    if summary.interrupted {
        println!();
        println!(
            "{} Interrupted after {} of {} images",
            WARNING,
            summary.stats.images_processed,
            summary.images_found
        );
        return Err(AssetSlimError::Interrupted.into());
    }

    present_summary(&summary, budget_bytes);

    if json_output {
        if let Some(report) = &summary.report {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }

    Ok(())
}

/// Render the final summary block
fn present_summary(summary: &PipelineSummary, budget_bytes: u64) {
    println!();
    match summary.backup {
        BackupStatus::Created => println!("{} Backup created", FLOPPY),
        BackupStatus::AlreadyExists => println!("{} Existing backup reused", FLOPPY),
    }

    let Some(report) = &summary.report else {
        return;
    };

    println!();
    println!("{} {}", CHART, style("STATISTICS").bold());
    println!(
        "   Original size:  {}",
        format_bytes(report.stats.original_size)
    );
    println!(
        "   Optimized size: {}",
        format_bytes(report.stats.optimized_size)
    );
    println!(
        "   Reduction:      {:.1}%",
        report.stats.compression_ratio
    );
    println!(
        "   Savings:        {}",
        format_bytes(
            report
                .stats
                .original_size
                .saturating_sub(report.stats.optimized_size)
        )
    );
    println!();
    println!("{} {}", CAMERA, style("IMAGES").bold());
    println!("   Processed:      {}", report.stats.images_processed);
    println!("   WebP converted: {}", report.stats.webp_converted);
    println!("   Resized:        {}", report.stats.resized_images);
    println!();
    println!("{} {}", PAGE, style("DATA FILES").bold());
    println!("   Found:          {}", summary.data_files_found);
    println!("   Compacted:      {}", summary.stats.data_files_compacted);

    if let Some(manifest) = &summary.manifest {
        println!();
        println!(
            "{} {} assets marked for remote migration",
            CLOUD,
            manifest.assets.len()
        );
    }

    present_skipped(summary);
    present_verdict(report, budget_bytes);

    println!();
    println!("{} Optimization complete", CHECKMARK);
}

fn present_skipped(summary: &PipelineSummary) {
    if summary.skipped.is_empty() {
        return;
    }
    println!();
    println!(
        "{} {} file(s) skipped:",
        WARNING,
        summary.skipped.len()
    );
    for skipped in &summary.skipped {
        println!(
            "   {} {}: {}",
            style("→").dim(),
            skipped.name,
            skipped.reason
        );
    }
}

fn present_verdict(report: &Report, budget_bytes: u64) {
    println!();
    if report.target_achieved {
        println!(
            "{} TARGET ACHIEVED! Assets <= {}",
            TARGET,
            format_bytes(budget_bytes)
        );
    } else {
        let remaining = report
            .stats
            .optimized_size
            .saturating_sub(budget_bytes);
        println!(
            "{} Still {} over the {} budget",
            WARNING,
            format_bytes(remaining),
            format_bytes(budget_bytes)
        );
        println!("   Suggestions:");
        for suggestion in report.suggestions() {
            println!("   - {suggestion}");
        }
    }
}
