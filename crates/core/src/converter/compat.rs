//! Stream-copy compatibility table.
//!
//! Decides whether a source can be remuxed into a target container without
//! re-encoding. An absent codec never matches an explicit codec list.
//! Matroska accepts anything a successful probe reports. A failed probe never
//! reaches this table; the command builder transcodes instead.

use super::types::{normalize_extension, StreamDescriptor};

/// Which codecs a container accepts for one stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecRule {
    /// Any codec, or no stream at all.
    Any,
    /// The stream type must be missing.
    Absent,
    /// The stream must be present and use one of these codecs.
    OneOf(&'static [&'static str]),
}

impl CodecRule {
    /// Checks a probed codec against this rule.
    pub fn accepts(&self, codec: Option<&str>) -> bool {
        match (self, codec) {
            (Self::Any, _) => true,
            (Self::Absent, codec) => codec.is_none(),
            (Self::OneOf(allowed), Some(codec)) => allowed.contains(&codec),
            (Self::OneOf(_), None) => false,
        }
    }
}

/// Copy rules for one target container.
#[derive(Debug, Clone, Copy)]
pub struct ContainerRule {
    pub container: &'static str,
    pub video: CodecRule,
    pub audio: CodecRule,
}

const MP4_VIDEO: &[&str] = &["h264", "hevc", "av1"];
const MP4_AUDIO: &[&str] = &["aac", "mp3"];
const WEBM_VIDEO: &[&str] = &["vp8", "vp9", "av1"];
const WEBM_AUDIO: &[&str] = &["vorbis", "opus"];

/// Containers that can take a stream copy, and what they hold.
pub const COPY_RULES: &[ContainerRule] = &[
    ContainerRule {
        container: "mp4",
        video: CodecRule::OneOf(MP4_VIDEO),
        audio: CodecRule::OneOf(MP4_AUDIO),
    },
    ContainerRule {
        container: "m4v",
        video: CodecRule::OneOf(MP4_VIDEO),
        audio: CodecRule::OneOf(MP4_AUDIO),
    },
    ContainerRule {
        container: "mov",
        video: CodecRule::OneOf(MP4_VIDEO),
        audio: CodecRule::OneOf(MP4_AUDIO),
    },
    ContainerRule {
        container: "webm",
        video: CodecRule::OneOf(WEBM_VIDEO),
        audio: CodecRule::OneOf(WEBM_AUDIO),
    },
    ContainerRule {
        container: "mkv",
        video: CodecRule::Any,
        audio: CodecRule::Any,
    },
    ContainerRule {
        container: "mp3",
        video: CodecRule::Absent,
        audio: CodecRule::OneOf(&["mp3"]),
    },
    ContainerRule {
        container: "aac",
        video: CodecRule::Absent,
        audio: CodecRule::OneOf(&["aac"]),
    },
    ContainerRule {
        container: "m4a",
        video: CodecRule::Absent,
        audio: CodecRule::OneOf(&["aac", "alac"]),
    },
    ContainerRule {
        container: "flac",
        video: CodecRule::Absent,
        audio: CodecRule::OneOf(&["flac"]),
    },
    ContainerRule {
        container: "wav",
        video: CodecRule::Absent,
        audio: CodecRule::OneOf(&["pcm_s16le", "pcm_s24le", "pcm_f32le"]),
    },
    ContainerRule {
        container: "ogg",
        video: CodecRule::Absent,
        audio: CodecRule::OneOf(&["vorbis", "opus"]),
    },
    ContainerRule {
        container: "opus",
        video: CodecRule::Absent,
        audio: CodecRule::OneOf(&["opus"]),
    },
];

/// Looks up the copy rule for a container, case-insensitively.
pub fn rule_for(container: &str) -> Option<&'static ContainerRule> {
    let container = normalize_extension(container);
    COPY_RULES.iter().find(|rule| rule.container == container)
}

/// Whether streams with these codecs can be copied verbatim into `container`.
pub fn is_safe_copy(container: &str, video_codec: Option<&str>, audio_codec: Option<&str>) -> bool {
    rule_for(container)
        .map(|rule| rule.video.accepts(video_codec) && rule.audio.accepts(audio_codec))
        .unwrap_or(false)
}

/// [`is_safe_copy`] over a probed descriptor.
pub fn can_stream_copy(container: &str, streams: &StreamDescriptor) -> bool {
    is_safe_copy(
        container,
        streams.video_codec.as_deref(),
        streams.audio_codec.as_deref(),
    )
}
