//! Types for the converter module.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default video codec. WebM targets swap it for VP9.
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";

/// Default audio codec. WebM targets swap it for Opus.
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Encoder settings used when a job has to be transcoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSettings {
    /// FFmpeg video encoder name.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    /// Encoder preset (x264/x265).
    #[serde(default = "default_preset")]
    pub preset: String,
    /// Constant Rate Factor (quality, lower = better).
    #[serde(default = "default_crf")]
    pub crf: u8,
    /// Encoder tune (film, animation, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tune: Option<String>,
    /// FFmpeg audio encoder name.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
    /// Audio bitrate (e.g. "192k"), applied to lossy audio only. An empty
    /// string leaves the bitrate to the encoder.
    #[serde(
        default = "default_audio_bitrate",
        deserialize_with = "deserialize_bitrate"
    )]
    pub audio_bitrate: Option<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}

fn default_audio_bitrate() -> Option<String> {
    Some("192k".to_string())
}

/// TOML has no null, so `""` is how a config file unsets the bitrate.
fn deserialize_bitrate<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let bitrate = Option::<String>::deserialize(deserializer)?;
    Ok(bitrate.filter(|b| !b.trim().is_empty()))
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            tune: None,
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

/// What to convert to and where to put it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertSettings {
    /// Target format, as an extension (`mp4`, `.MP3`, ...).
    pub to: String,
    /// Descend into subdirectories when the input is a directory.
    #[serde(default)]
    pub recursive: bool,
    /// Output directory. Outputs go next to their sources when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Transcode settings.
    #[serde(default)]
    pub video: VideoSettings,
}

impl ConvertSettings {
    /// Creates settings for a target format with everything else defaulted.
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            recursive: false,
            output_dir: None,
            video: VideoSettings::default(),
        }
    }

    /// Target extension without the leading dot, lowercased.
    pub fn target_extension(&self) -> String {
        normalize_extension(&self.to)
    }
}

pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Lowercased extension of a path, empty if it has none.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| normalize_extension(&e.to_string_lossy()))
        .unwrap_or_default()
}

/// One planned conversion. Created by the planner, consumed once by the executor.
#[derive(Debug, Clone)]
pub struct ConvertJob {
    /// Input file path.
    pub source: PathBuf,
    /// Final output path.
    pub destination: PathBuf,
    /// Settings shared by every job of the same plan.
    pub settings: Arc<ConvertSettings>,
}

impl ConvertJob {
    /// Lowercased extension of the destination.
    pub fn target_extension(&self) -> String {
        extension_of(&self.destination)
    }
}

/// Codecs of the first video and first audio stream of a probed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Video codec (if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    /// Audio codec (if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
}

impl StreamDescriptor {
    /// Creates a descriptor from known codecs.
    pub fn new(video_codec: Option<&str>, audio_codec: Option<&str>) -> Self {
        Self {
            video_codec: video_codec.map(str::to_string),
            audio_codec: audio_codec.map(str::to_string),
        }
    }

    /// Descriptor used when probing failed.
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Family of a target container, which picks the argument layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFamily {
    /// mp4, mkv, mov, webm
    Video,
    /// mp3, aac, flac, m4a, wav, ogg, opus
    Audio,
    /// Anything else; remuxed with stream copy.
    Generic,
}

impl ContainerFamily {
    /// Classifies a (normalized) extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "mp4" | "mkv" | "mov" | "webm" => Self::Video,
            "mp3" | "aac" | "flac" | "m4a" | "wav" | "ogg" | "opus" => Self::Audio,
            _ => Self::Generic,
        }
    }
}

/// Whether the container benefits from `-movflags +faststart`.
pub(crate) fn is_faststart_container(ext: &str) -> bool {
    matches!(ext, "mp4" | "mov" | "m4v")
}

/// Final state of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Destination was already up to date; the encoder was not run.
    Skipped,
    /// Command was logged but not run.
    DryRun,
    /// Encoder succeeded and the output was moved into place.
    Committed,
    /// Encoder or bookkeeping failed; the destination is untouched.
    Failed(String),
}

impl JobOutcome {
    /// Skipped, dry-run and committed jobs all count as successes.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Result of a single job.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// The job that ran.
    pub job: ConvertJob,
    /// What happened.
    pub outcome: JobOutcome,
    /// Wall time spent on the job in milliseconds.
    pub duration_ms: u64,
}

/// Aggregate result of an `execute` call.
#[derive(Debug, Clone, Default)]
pub struct ExecutionSummary {
    /// Number of jobs submitted.
    pub total: usize,
    /// Number of jobs that counted as successes.
    pub succeeded: usize,
    /// Per-job results, in submission order.
    pub results: Vec<JobResult>,
}

impl ExecutionSummary {
    /// Number of failed jobs.
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    /// Number of jobs with the given outcome kind.
    pub fn count(&self, predicate: impl Fn(&JobOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

/// Knobs for a single `execute` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteOptions {
    /// Worker count. Defaults to half the available cores (at least 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Probe sources and remux instead of transcoding when the codecs fit.
    #[serde(default = "default_true")]
    pub smart_copy: bool,
    /// Log commands instead of running them.
    #[serde(default)]
    pub dry_run: bool,
    /// Skip jobs whose destination is non-empty and not older than the source.
    #[serde(default = "default_true")]
    pub skip_if_up_to_date: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            workers: None,
            smart_copy: true,
            dry_run: false,
            skip_if_up_to_date: true,
        }
    }
}

impl ExecuteOptions {
    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Enables dry-run mode.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Worker count to actually use.
    pub fn resolved_workers(&self) -> usize {
        match self.workers {
            Some(n) => n.max(1),
            None => default_workers(),
        }
    }
}

/// Half the available parallelism: every worker drives its own encoder
/// process, which is usually multi-threaded itself.
pub fn default_workers() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores / 2).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_extension_normalized() {
        assert_eq!(ConvertSettings::new("mp4").target_extension(), "mp4");
        assert_eq!(ConvertSettings::new(".MKV").target_extension(), "mkv");
        assert_eq!(ConvertSettings::new(" Mp3 ").target_extension(), "mp3");
    }

    #[test]
    fn test_video_settings_defaults() {
        let video = VideoSettings::default();
        assert_eq!(video.video_codec, "libx264");
        assert_eq!(video.preset, "medium");
        assert_eq!(video.crf, 23);
        assert_eq!(video.tune, None);
        assert_eq!(video.audio_codec, "aac");
        assert_eq!(video.audio_bitrate.as_deref(), Some("192k"));
    }

    #[test]
    fn test_empty_audio_bitrate_unsets_it() {
        let video: VideoSettings = toml::from_str(r#"audio_bitrate = """#).unwrap();
        assert_eq!(video.audio_bitrate, None);

        let video: VideoSettings = toml::from_str(r#"audio_bitrate = "128k""#).unwrap();
        assert_eq!(video.audio_bitrate.as_deref(), Some("128k"));

        let video: VideoSettings = toml::from_str("").unwrap();
        assert_eq!(video.audio_bitrate.as_deref(), Some("192k"));
    }

    #[test]
    fn test_container_family() {
        assert_eq!(ContainerFamily::from_extension("mov"), ContainerFamily::Video);
        assert_eq!(ContainerFamily::from_extension("webm"), ContainerFamily::Video);
        assert_eq!(ContainerFamily::from_extension("wav"), ContainerFamily::Audio);
        assert_eq!(ContainerFamily::from_extension("opus"), ContainerFamily::Audio);
        assert_eq!(ContainerFamily::from_extension("ts"), ContainerFamily::Generic);
        assert_eq!(ContainerFamily::from_extension(""), ContainerFamily::Generic);
    }

    #[test]
    fn test_outcome_success() {
        assert!(JobOutcome::Skipped.is_success());
        assert!(JobOutcome::DryRun.is_success());
        assert!(JobOutcome::Committed.is_success());
        assert!(!JobOutcome::Failed("boom".to_string()).is_success());
    }

    #[test]
    fn test_resolved_workers() {
        assert_eq!(ExecuteOptions::default().with_workers(3).resolved_workers(), 3);
        assert_eq!(ExecuteOptions::default().with_workers(0).resolved_workers(), 1);
        let default = ExecuteOptions::default().resolved_workers();
        assert!(default >= 1);
        assert_eq!(default, default_workers());
    }

    #[test]
    fn test_execute_options_from_toml() {
        let options: ExecuteOptions = toml::from_str("workers = 2\ndry_run = true").unwrap();
        assert_eq!(options.workers, Some(2));
        assert!(options.dry_run);
        assert!(options.smart_copy);
        assert!(options.skip_if_up_to_date);
    }

    #[test]
    fn test_stream_descriptor_unknown() {
        let unknown = StreamDescriptor::unknown();
        assert!(unknown.video_codec.is_none());
        assert!(unknown.audio_codec.is_none());
    }
}
