use serde::{Deserialize, Serialize};

use crate::converter::{ConverterConfig, ExecuteOptions, VideoSettings};

/// Root configuration
///
/// Every section is optional; an empty file yields the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// External tool locations and encoder invocation knobs.
    #[serde(default)]
    pub converter: ConverterConfig,
    /// Worker pool and per-run behavior.
    #[serde(default)]
    pub execute: ExecuteOptions,
    /// Encoder settings used when a job has to be transcoded.
    #[serde(default)]
    pub video: VideoSettings,
}
