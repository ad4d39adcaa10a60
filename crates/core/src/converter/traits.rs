//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use super::command::FfmpegCommand;
use super::config::ConverterConfig;
use super::error::ConverterError;
use super::types::StreamDescriptor;

/// Access to the external encoder and prober.
///
/// The planner and executor only talk to the outside world through this
/// trait, which lets tests swap in [`MockConverter`](crate::testing::MockConverter).
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Configuration used when building commands.
    fn config(&self) -> &ConverterConfig;

    /// Checks that the external tools are available.
    async fn validate(&self) -> Result<(), ConverterError>;

    /// Probes a media file for its first video and audio codecs.
    ///
    /// Callers treat errors as advisory; see [`probe_streams`].
    async fn probe(&self, path: &Path) -> Result<StreamDescriptor, ConverterError>;

    /// Runs a built command to completion.
    async fn run(&self, command: &FfmpegCommand) -> Result<(), ConverterError>;
}

/// Probes `path`, returning `None` when the probe fails.
///
/// A failed probe is not the same as a file with no streams: callers must not
/// stream-copy on `None`.
pub async fn probe_streams<C: Converter + ?Sized>(
    converter: &C,
    path: &Path,
) -> Option<StreamDescriptor> {
    match converter.probe(path).await {
        Ok(streams) => Some(streams),
        Err(e) => {
            debug!("Probe of {} failed, will transcode: {}", path.display(), e);
            None
        }
    }
}
