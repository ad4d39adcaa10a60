//! FFmpeg command construction.
//!
//! Everything here is pure: a command is built from a job, the config and an
//! optional probe result, and handed to a [`Converter`](super::Converter) to run.

use std::fmt;
use std::path::{Path, PathBuf};

use super::compat::can_stream_copy;
use super::config::ConverterConfig;
use super::types::{
    is_faststart_container, ContainerFamily, ConvertJob, StreamDescriptor, VideoSettings,
    DEFAULT_AUDIO_CODEC, DEFAULT_VIDEO_CODEC,
};

/// A fully-built external process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegCommand {
    /// Binary to run.
    pub program: PathBuf,
    /// Arguments, excluding the binary.
    pub args: Vec<String>,
}

impl FfmpegCommand {
    /// The input path (the value following `-i`).
    pub fn input(&self) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// The output path (always the last argument).
    pub fn output(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    /// Whether this is a stream-copy remux rather than a transcode.
    pub fn is_stream_copy(&self) -> bool {
        self.args.windows(2).any(|w| w[0] == "-c" && w[1] == "copy")
    }

    /// Whether `flag` appears as an argument.
    pub fn has_arg(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Value following `flag`, if present.
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for FfmpegCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Builds the encoder command for `job`, writing to `output`.
///
/// `streams` is the probe result when smart copy is on. If the probed codecs
/// fit the target container the result is a lossless remux; otherwise the
/// layout is picked from the target's container family.
pub fn build_command(
    config: &ConverterConfig,
    job: &ConvertJob,
    output: &Path,
    streams: Option<&StreamDescriptor>,
) -> FfmpegCommand {
    let ext = job.target_extension();
    let mut args = base_args(config, &job.source);

    match streams {
        Some(streams) if can_stream_copy(&ext, streams) => push_remux_args(&mut args, &ext),
        _ => match ContainerFamily::from_extension(&ext) {
            ContainerFamily::Video => push_video_args(&mut args, &ext, &job.settings.video),
            ContainerFamily::Audio => push_audio_args(&mut args, &ext, &job.settings.video),
            ContainerFamily::Generic => args.extend(["-c".to_string(), "copy".to_string()]),
        },
    }

    args.extend(config.extra_ffmpeg_args.iter().cloned());
    args.push(output.to_string_lossy().to_string());

    FfmpegCommand {
        program: config.ffmpeg_path.clone(),
        args,
    }
}

fn base_args(config: &ConverterConfig, input: &Path) -> Vec<String> {
    vec![
        "-y".to_string(), // Overwrite output
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        config.ffmpeg_log_level.clone(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
    ]
}

fn push_remux_args(args: &mut Vec<String>, ext: &str) {
    args.extend([
        "-map".to_string(),
        "0".to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-map_metadata".to_string(),
        "0".to_string(),
    ]);
    if is_faststart_container(ext) {
        args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    }
}

fn push_video_args(args: &mut Vec<String>, ext: &str, video: &VideoSettings) {
    let (video_codec, audio_codec) = video_codecs_for(ext, video);

    args.extend(["-c:v".to_string(), video_codec.to_string()]);
    if video_codec.starts_with("libvpx") {
        // libvpx has no presets; CRF needs a zero target bitrate.
        args.extend(["-crf".to_string(), video.crf.to_string()]);
        args.extend(["-b:v".to_string(), "0".to_string()]);
    } else {
        args.extend(["-preset".to_string(), video.preset.clone()]);
        args.extend(["-crf".to_string(), video.crf.to_string()]);
    }
    if let Some(ref tune) = video.tune {
        args.extend(["-tune".to_string(), tune.clone()]);
    }

    args.extend(["-c:a".to_string(), audio_codec.to_string()]);
    if let Some(ref bitrate) = video.audio_bitrate {
        args.extend(["-b:a".to_string(), bitrate.clone()]);
    }

    if is_faststart_container(ext) {
        args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    }
}

/// Video and audio encoder for a video container. WebM cannot hold the
/// H.264/AAC defaults, so those are swapped for VP9/Opus.
fn video_codecs_for<'a>(ext: &str, video: &'a VideoSettings) -> (&'a str, &'a str) {
    let mut video_codec = video.video_codec.as_str();
    let mut audio_codec = video.audio_codec.as_str();
    if ext == "webm" {
        if video_codec == DEFAULT_VIDEO_CODEC {
            video_codec = "libvpx-vp9";
        }
        if audio_codec == DEFAULT_AUDIO_CODEC {
            audio_codec = "libopus";
        }
    }
    (video_codec, audio_codec)
}

/// Canonical encoder for an audio-only container and whether it is lossless.
pub fn audio_codec_for(ext: &str) -> Option<(&'static str, bool)> {
    match ext {
        "mp3" => Some(("libmp3lame", false)),
        "aac" | "m4a" => Some(("aac", false)),
        "flac" => Some(("flac", true)),
        "wav" => Some(("pcm_s16le", true)),
        "ogg" => Some(("libvorbis", false)),
        "opus" => Some(("libopus", false)),
        _ => None,
    }
}

fn push_audio_args(args: &mut Vec<String>, ext: &str, video: &VideoSettings) {
    args.push("-vn".to_string());
    if let Some((codec, lossless)) = audio_codec_for(ext) {
        args.extend(["-c:a".to_string(), codec.to_string()]);
        if !lossless {
            if let Some(ref bitrate) = video.audio_bitrate {
                args.extend(["-b:a".to_string(), bitrate.clone()]);
            }
        }
    }
}
