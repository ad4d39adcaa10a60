//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{
    Converter, ConverterConfig, ConverterError, FfmpegCommand, StreamDescriptor,
};

/// Bytes the mock writes before failing, to exercise partial-output cleanup.
pub const PARTIAL_BYTES: &[u8] = b"truncated";

/// A recorded encoder run for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    /// The command that was submitted.
    pub command: FfmpegCommand,
    /// Whether the run succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Records every command it is asked to run
/// - Writes fake output to the command's output path
/// - Scripted probe results, failures, panics and missing tools
///
/// # Example
///
/// ```rust,ignore
/// use eyn_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.fail_source("/media/broken.mov").await;
///
/// let executor = ConversionExecutor::new(converter.clone());
/// let summary = executor.execute(jobs, &ExecuteOptions::default()).await;
///
/// assert_eq!(converter.run_count().await, jobs_len);
/// ```
#[derive(Debug, Clone)]
pub struct MockConverter {
    config: ConverterConfig,
    /// Recorded runs, in the order they started.
    runs: Arc<RwLock<Vec<RecordedRun>>>,
    /// Number of probe calls.
    probes: Arc<AtomicUsize>,
    /// Pre-configured probe results by path.
    probe_results: Arc<RwLock<HashMap<PathBuf, StreamDescriptor>>>,
    /// Whether every probe should fail.
    probe_fails: Arc<RwLock<bool>>,
    /// Sources whose runs exit non-zero.
    failing_sources: Arc<RwLock<HashSet<PathBuf>>>,
    /// Sources whose runs panic.
    panicking_sources: Arc<RwLock<HashSet<PathBuf>>>,
    /// Sources whose runs succeed without writing output.
    silent_sources: Arc<RwLock<HashSet<PathBuf>>>,
    /// Tool reported missing by `validate`.
    missing_tool: Arc<RwLock<Option<String>>>,
    /// Simulated run duration.
    run_duration_ms: Arc<RwLock<u64>>,
    active_runs: Arc<AtomicUsize>,
    peak_runs: Arc<AtomicUsize>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self::with_config(ConverterConfig::default())
    }

    /// Create a mock converter that builds commands with `config`.
    pub fn with_config(config: ConverterConfig) -> Self {
        Self {
            config,
            runs: Arc::new(RwLock::new(Vec::new())),
            probes: Arc::new(AtomicUsize::new(0)),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            probe_fails: Arc::new(RwLock::new(false)),
            failing_sources: Arc::new(RwLock::new(HashSet::new())),
            panicking_sources: Arc::new(RwLock::new(HashSet::new())),
            silent_sources: Arc::new(RwLock::new(HashSet::new())),
            missing_tool: Arc::new(RwLock::new(None)),
            run_duration_ms: Arc::new(RwLock::new(0)),
            active_runs: Arc::new(AtomicUsize::new(0)),
            peak_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded runs.
    pub async fn recorded_runs(&self) -> Vec<RecordedRun> {
        self.runs.read().await.clone()
    }

    /// Get the number of encoder runs performed.
    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Inputs of the recorded runs, in start order.
    pub async fn run_inputs(&self) -> Vec<PathBuf> {
        self.runs
            .read()
            .await
            .iter()
            .filter_map(|r| r.command.input().map(PathBuf::from))
            .collect()
    }

    /// Clear recorded runs.
    pub async fn clear_recorded(&self) {
        self.runs.write().await.clear();
    }

    /// Get the number of probe calls.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Highest number of runs that were in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_runs.load(Ordering::SeqCst)
    }

    /// Set a probe result for a specific path.
    pub async fn set_probe_result(&self, path: impl AsRef<Path>, streams: StreamDescriptor) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), streams);
    }

    /// Make every probe fail.
    pub async fn set_probe_fails(&self, fails: bool) {
        *self.probe_fails.write().await = fails;
    }

    /// Make runs for `source` exit non-zero after writing partial output.
    pub async fn fail_source(&self, source: impl AsRef<Path>) {
        self.failing_sources
            .write()
            .await
            .insert(source.as_ref().to_path_buf());
    }

    /// Make runs for `source` panic.
    pub async fn panic_on_source(&self, source: impl AsRef<Path>) {
        self.panicking_sources
            .write()
            .await
            .insert(source.as_ref().to_path_buf());
    }

    /// Make runs for `source` succeed without writing anything.
    pub async fn skip_output_for(&self, source: impl AsRef<Path>) {
        self.silent_sources
            .write()
            .await
            .insert(source.as_ref().to_path_buf());
    }

    /// Report `tool` as missing from `validate`.
    pub async fn set_missing_tool(&self, tool: impl Into<String>) {
        *self.missing_tool.write().await = Some(tool.into());
    }

    /// Set the simulated run duration.
    pub async fn set_run_duration(&self, duration: Duration) {
        *self.run_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Content the mock writes for a successful run of `input`.
    pub fn output_for(input: &str) -> Vec<u8> {
        format!("converted:{}", input).into_bytes()
    }

    /// Default probe result, derived from the file extension.
    fn default_streams(path: &Path) -> Option<StreamDescriptor> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "mkv" | "mp4" | "mov" | "avi" => Some(StreamDescriptor::new(Some("h264"), Some("aac"))),
            "webm" => Some(StreamDescriptor::new(Some("vp9"), Some("opus"))),
            "mp3" => Some(StreamDescriptor::new(None, Some("mp3"))),
            "flac" => Some(StreamDescriptor::new(None, Some("flac"))),
            "wav" => Some(StreamDescriptor::new(None, Some("pcm_s16le"))),
            _ => None,
        }
    }

    async fn record(&self, command: &FfmpegCommand, success: bool) {
        self.runs.write().await.push(RecordedRun {
            command: command.clone(),
            success,
        });
    }
}

/// Tracks in-flight runs for `peak_concurrency`.
struct ActiveRun<'a> {
    active: &'a AtomicUsize,
}

impl<'a> ActiveRun<'a> {
    fn start(active: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { active }
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    fn config(&self) -> &ConverterConfig {
        &self.config
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        match self.missing_tool.read().await.as_ref() {
            Some(tool) => Err(ConverterError::missing_dependency(tool.clone())),
            None => Ok(()),
        }
    }

    async fn probe(&self, path: &Path) -> Result<StreamDescriptor, ConverterError> {
        self.probes.fetch_add(1, Ordering::SeqCst);

        if *self.probe_fails.read().await {
            return Err(ConverterError::probe_failed("mock probe failure"));
        }

        // Check for pre-configured result
        if let Some(streams) = self.probe_results.read().await.get(path) {
            return Ok(streams.clone());
        }

        Self::default_streams(path)
            .ok_or_else(|| ConverterError::probe_failed("unrecognized extension"))
    }

    async fn run(&self, command: &FfmpegCommand) -> Result<(), ConverterError> {
        let _active = ActiveRun::start(&self.active_runs, &self.peak_runs);

        let input = PathBuf::from(command.input().unwrap_or_default());
        let output = PathBuf::from(command.output().unwrap_or_default());

        // Simulate conversion time
        let duration_ms = *self.run_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        if self.panicking_sources.read().await.contains(&input) {
            self.record(command, false).await;
            panic!("mock encoder panicked on {}", input.display());
        }

        if self.failing_sources.read().await.contains(&input) {
            self.record(command, false).await;
            tokio::fs::write(&output, PARTIAL_BYTES).await?;
            return Err(ConverterError::conversion_failed(
                "FFmpeg exited with code: Some(1)",
                Some("Invalid data found when processing input".to_string()),
            ));
        }

        self.record(command, true).await;
        if !self.silent_sources.read().await.contains(&input) {
            tokio::fs::write(&output, Self::output_for(&input.to_string_lossy())).await?;
        }
        Ok(())
    }
}
