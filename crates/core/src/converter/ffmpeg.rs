//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::capabilities::require_tools;
use super::command::FfmpegCommand;
use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::StreamDescriptor;

/// Lines of encoder stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Runs the real `ffmpeg` and `ffprobe` binaries.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Parses ffprobe JSON output, keeping the first video and audio codec.
    pub fn parse_probe_output(output: &str) -> Result<StreamDescriptor, ConverterError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            codec_name: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| ConverterError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let first_codec = |kind: &str| {
            probe
                .streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some(kind))
                .and_then(|s| s.codec_name.clone())
        };

        Ok(StreamDescriptor {
            video_codec: first_codec("video"),
            audio_codec: first_codec("audio"),
        })
    }

    fn not_found_or_io(&self, e: std::io::Error, tool: &Path) -> ConverterError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConverterError::missing_dependency(tool.display().to_string())
        } else {
            ConverterError::Io(e)
        }
    }
}

/// Last few non-empty lines of stderr, or `None` if there were none.
fn stderr_tail(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return None;
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    Some(lines[start..].join("\n"))
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn config(&self) -> &ConverterConfig {
        &self.config
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        require_tools(&self.config).map(|_| ())
    }

    async fn probe(&self, path: &Path) -> Result<StreamDescriptor, ConverterError> {
        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.not_found_or_io(e, &self.config.ffprobe_path))?;

        if !output.status.success() {
            return Err(ConverterError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(&stdout)
    }

    async fn run(&self, command: &FfmpegCommand) -> Result<(), ConverterError> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.not_found_or_io(e, &command.program))?;

        let output = match self.config.timeout_secs {
            Some(secs) => match timeout(Duration::from_secs(secs), child.wait_with_output()).await
            {
                Ok(result) => result?,
                // Dropping the future drops the child, which kills it.
                Err(_) => return Err(ConverterError::Timeout { timeout_secs: secs }),
            },
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            return Err(ConverterError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", output.status.code()),
                stderr_tail(&output.stderr),
            ));
        }

        Ok(())
    }
}
