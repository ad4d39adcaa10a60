//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while planning or running conversions.
///
/// `MissingDependency` and `NoInputFiles` are returned by planning and abort the
/// whole run. Everything else is scoped to a single job and is reported through
/// [`JobOutcome::Failed`](super::JobOutcome::Failed) instead of propagating.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// A required external binary could not be resolved.
    #[error("{tool} not found on PATH. {hint}")]
    MissingDependency { tool: String, hint: String },

    /// Discovery found nothing to convert.
    #[error("No input files found at: {path}")]
    NoInputFiles { path: PathBuf },

    /// Failed to probe media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Failed to parse FFprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// Conversion process failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The encoder exited cleanly but left no output behind.
    #[error("Encoder produced no output at: {path}")]
    OutputMissing { path: PathBuf },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a missing dependency error with the standard install hint.
    pub fn missing_dependency(tool: impl Into<String>) -> Self {
        Self::MissingDependency {
            tool: tool.into(),
            hint: "Install FFmpeg and ensure `ffmpeg` and `ffprobe` are available on PATH."
                .to_string(),
        }
    }

    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Whether this error aborts planning rather than a single job.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingDependency { .. } | Self::NoInputFiles { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_message_has_hint() {
        let err = ConverterError::missing_dependency("ffprobe");
        let msg = err.to_string();
        assert!(msg.starts_with("ffprobe not found on PATH."));
        assert!(msg.contains("Install FFmpeg"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ConverterError::missing_dependency("ffmpeg").is_fatal());
        assert!(ConverterError::NoInputFiles {
            path: PathBuf::from("/nowhere")
        }
        .is_fatal());
        assert!(!ConverterError::conversion_failed("exit 1", None).is_fatal());
        assert!(!ConverterError::Timeout { timeout_secs: 5 }.is_fatal());
    }
}
