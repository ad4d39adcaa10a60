//! External tool detection.

use std::path::{Path, PathBuf};

use super::config::ConverterConfig;
use super::error::ConverterError;

/// Resolved locations of the encoder and prober.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

/// Resolves both configured binaries, failing on the first one missing.
///
/// Runs once per plan; nothing here scales with the number of files.
pub fn require_tools(config: &ConverterConfig) -> Result<ToolPaths, ConverterError> {
    Ok(ToolPaths {
        ffmpeg: resolve(&config.ffmpeg_path)?,
        ffprobe: resolve(&config.ffprobe_path)?,
    })
}

fn resolve(binary: &Path) -> Result<PathBuf, ConverterError> {
    which::which(binary).map_err(|_| {
        let tool = binary
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| binary.display().to_string());
        ConverterError::missing_dependency(tool)
    })
}
