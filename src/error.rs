//! Top-level error type with contextual suggestions and exit codes.
//!
//! Only conditions that end the program live here. Per-file failures in the
//! optimization phases are outcomes, not errors, and never reach this type.

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::PipelineError;

/// Errors surfaced to the user at the CLI boundary
#[derive(Error, Debug)]
pub enum AssetSlimError {
    /// Configuration file present but unusable
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid {
        /// Path to the configuration file
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// Run stopped by an interrupt signal
    #[error("Optimization interrupted")]
    Interrupted,

    /// Generic I/O error with context
    #[error("I/O error: {context}")]
    Io {
        /// Where the error occurred
        context: String,
        #[source]
        /// IO error source
        source: std::io::Error,
    },

    /// Fatal pipeline error
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

impl AssetSlimError {
    /// Get actionable suggestion for resolving this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use asset_slim::error::AssetSlimError;
    /// use asset_slim::pipeline::PipelineError;
    /// use std::path::PathBuf;
    ///
    /// let error = AssetSlimError::Pipeline(PipelineError::RootNotFound(
    ///     PathBuf::from("/missing"),
    /// ));
    /// assert!(error.suggestion().is_some());
    /// ```
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::ConfigInvalid { path, .. } => Some(format!(
                "Fix or delete {} and re-run; without it the built-in defaults apply",
                path.display()
            )),
            Self::Interrupted => Some(
                "Assets may be partially optimized. Re-running resumes safely; \
                 the backup from the first run is preserved"
                    .to_string(),
            ),
            Self::Io { context, .. } => Some(format!(
                "Check file permissions and that {} is accessible",
                context
            )),
            Self::Pipeline(e) => match e {
                PipelineError::RootNotFound(path) => Some(format!(
                    "Pass the asset root explicitly: asset-slim {}",
                    path.display()
                )),
                PipelineError::Backup(_) => Some(
                    "No files were modified. Free up disk space or remove a stale \
                     assets_backup directory, then re-run"
                        .to_string(),
                ),
                _ => None,
            },
        }
    }

    /// Get appropriate exit code for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use asset_slim::error::AssetSlimError;
    ///
    /// assert_eq!(AssetSlimError::Interrupted.exit_code(), 130);
    /// ```
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigInvalid { .. } => 78, // EX_CONFIG (sysexits.h)
            Self::Interrupted => 130,         // 128 + SIGINT
            Self::Io { .. } => 74,            // EX_IOERR
            Self::Pipeline(_) => 1,           // Generic error
        }
    }
}

/// Error formatter with colors and structured output
pub struct ErrorFormatter;

impl ErrorFormatter {
    /// Format error with cause chain and suggestions
    pub fn format(error: &anyhow::Error) -> String {
        use console::style;

        let mut output = String::new();

        output.push_str(&format!("{} {}\n", style("error:").red().bold(), error));

        let mut source = error.source();
        let mut indent = 1;
        while let Some(err) = source {
            output.push_str(&format!(
                "{}{} {}\n",
                "  ".repeat(indent),
                style("caused by:").yellow(),
                err
            ));
            source = err.source();
            indent += 1;
        }

        if let Some(as_error) = error.downcast_ref::<AssetSlimError>() {
            if let Some(suggestion) = as_error.suggestion() {
                output.push_str(&format!(
                    "\n{} {}\n",
                    style("help:").cyan().bold(),
                    suggestion
                ));
            }
        }

        output
    }

    /// Resolve the process exit code for an error, defaulting to 1 when the
    /// error is not an [`AssetSlimError`]
    pub fn exit_code(error: &anyhow::Error) -> i32 {
        error
            .downcast_ref::<AssetSlimError>()
            .map(AssetSlimError::exit_code)
            .unwrap_or(1)
    }
}
