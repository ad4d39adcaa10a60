//! Converter module for batch media conversion.
//!
//! This module plans and runs conversions of files or whole directories with
//! FFmpeg.
//!
//! # Features
//!
//! - Input discovery with hidden/system file filtering
//! - Smart copy: probe the source and remux losslessly when the target
//!   container can hold its codecs
//! - Video (mp4/mkv/mov/webm) and audio-only (mp3/aac/flac/m4a/wav/ogg/opus)
//!   transcoding, stream copy for anything else
//! - Bounded worker pool, skip-if-up-to-date, atomic output commit
//!
//! # Example
//!
//! ```ignore
//! use eyn_core::converter::{
//!     plan_conversions, ConversionExecutor, ConvertSettings, ExecuteOptions, FfmpegConverter,
//! };
//!
//! let converter = FfmpegConverter::with_defaults();
//!
//! // Fails fast if ffmpeg/ffprobe are missing or nothing was found
//! let jobs = plan_conversions(&converter, Path::new("/media/clips"), ConvertSettings::new("mp4")).await?;
//!
//! let executor = ConversionExecutor::new(converter);
//! let summary = executor.execute(jobs, &ExecuteOptions::default()).await;
//! println!("{}/{} completed", summary.succeeded, summary.total);
//! ```

mod capabilities;
mod command;
mod compat;
mod config;
mod discovery;
mod error;
mod executor;
mod ffmpeg;
mod planner;
mod traits;
mod types;

pub use capabilities::{require_tools, ToolPaths};
pub use command::{audio_codec_for, build_command, FfmpegCommand};
pub use compat::{can_stream_copy, is_safe_copy, rule_for, CodecRule, ContainerRule, COPY_RULES};
pub use config::{ConverterConfig, FFMPEG_LOG_LEVELS};
pub use discovery::{discover_files, is_ignored_name};
pub use error::ConverterError;
pub use executor::{is_up_to_date, partial_path_for, ConversionExecutor, PARTIAL_MARKER};
pub use ffmpeg::FfmpegConverter;
pub use planner::{destination_for, plan_conversions, COLLISION_MARKER};
pub use traits::{probe_streams, Converter};
pub use types::{
    default_workers, ContainerFamily, ConvertJob, ConvertSettings, ExecuteOptions,
    ExecutionSummary, JobOutcome, JobResult, StreamDescriptor, VideoSettings,
    DEFAULT_AUDIO_CODEC, DEFAULT_VIDEO_CODEC,
};
