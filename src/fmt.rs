//! Shared formatting utilities for size display and console output

use console::Emoji;

/// Rocket emoji for launch/start operations
pub const ROCKET: Emoji = Emoji("🚀", ">");

/// Checkmark emoji for success
pub const CHECKMARK: Emoji = Emoji("✅", "[OK]");

/// Crossmark emoji for failure
pub const CROSSMARK: Emoji = Emoji("❌", "[FAIL]");

/// Folder emoji for directory paths
pub const FOLDER: Emoji = Emoji("📁", "*");

/// Chart emoji for metrics/statistics
pub const CHART: Emoji = Emoji("📊", "~");

/// Camera emoji for image operations
pub const CAMERA: Emoji = Emoji("🖼️", "#");

/// Floppy emoji for backup/storage operations
pub const FLOPPY: Emoji = Emoji("💾", "=");

/// Page emoji for data-file operations
pub const PAGE: Emoji = Emoji("📄", "-");

/// Cloud emoji for remote-asset operations
pub const CLOUD: Emoji = Emoji("☁️", "^");

/// Target emoji for budget verdicts
pub const TARGET: Emoji = Emoji("🎯", "@");

/// Warning emoji for caution/alerts
pub const WARNING: Emoji = Emoji("⚠️", "!");

/// Format bytes as human-readable size string
///
/// # Examples
///
/// ```
/// use asset_slim::fmt::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(1_048_576), "1.00 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a size reduction as a percentage of the original size
///
/// Returns 0.0 when the original size is zero.
pub fn reduction_percent(before: u64, after: u64) -> f64 {
    if before == 0 {
        return 0.0;
    }
    ((before as f64 - after as f64) / before as f64) * 100.0
}
