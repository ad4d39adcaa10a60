//! Conversion job executor.
//!
//! Runs planned jobs on a bounded pool. Each job goes through
//! skip check → probe → command build → encoder run → commit, and a failure in
//! one job never affects its siblings.
//!
//! Outputs are written to a `.part` sibling of the destination and renamed into
//! place only after the encoder exits cleanly, so a destination is either its
//! old content or the complete new file.

use futures::FutureExt;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::command::build_command;
use super::error::ConverterError;
use super::traits::{probe_streams, Converter};
use super::types::{ConvertJob, ExecuteOptions, ExecutionSummary, JobOutcome, JobResult};

/// Infix marking an in-progress output.
pub const PARTIAL_MARKER: &str = "part";

/// Runs conversion jobs against a [`Converter`].
pub struct ConversionExecutor<C: Converter> {
    converter: Arc<C>,
}

impl<C: Converter + 'static> ConversionExecutor<C> {
    /// Creates a new executor.
    pub fn new(converter: C) -> Self {
        Self {
            converter: Arc::new(converter),
        }
    }

    /// Runs every job and reports how many succeeded.
    ///
    /// Never fails as a whole: per-job errors end up in the summary. With a
    /// single worker, jobs run inline and in order.
    pub async fn execute(&self, jobs: Vec<ConvertJob>, options: &ExecuteOptions) -> ExecutionSummary {
        let total = jobs.len();
        if total == 0 {
            info!("0/0 completed");
            return ExecutionSummary::default();
        }

        if !options.dry_run {
            ensure_output_dirs(&jobs).await;
        }

        let workers = options.resolved_workers().min(total);
        let succeeded = Arc::new(AtomicUsize::new(0));
        let mut slots: Vec<Option<JobResult>> = vec![None; total];
        let submitted = jobs.clone();

        if workers == 1 {
            for (index, job) in jobs.into_iter().enumerate() {
                let result =
                    run_guarded(Arc::clone(&self.converter), job, options.clone(), &succeeded)
                        .await;
                slots[index] = Some(result);
            }
        } else {
            debug!("Running {} job(s) on {} workers", total, workers);
            let semaphore = Arc::new(Semaphore::new(workers));
            let mut tasks = JoinSet::new();

            for (index, job) in jobs.into_iter().enumerate() {
                let converter = Arc::clone(&self.converter);
                let semaphore = Arc::clone(&semaphore);
                let succeeded = Arc::clone(&succeeded);
                let options = options.clone();
                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    (index, run_guarded(converter, job, options, &succeeded).await)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, result)) => slots[index] = Some(result),
                    Err(e) => error!("Conversion worker aborted: {}", e),
                }
            }
        }

        let results: Vec<JobResult> = slots
            .into_iter()
            .zip(submitted)
            .map(|(slot, job)| {
                slot.unwrap_or_else(|| JobResult {
                    job,
                    outcome: JobOutcome::Failed("worker aborted".to_string()),
                    duration_ms: 0,
                })
            })
            .collect();

        let succeeded = succeeded.load(Ordering::SeqCst);
        info!("{}/{} completed", succeeded, total);

        ExecutionSummary {
            total,
            succeeded,
            results,
        }
    }
}

/// Runs one job, turning a panic anywhere in it into that job's failure.
async fn run_guarded<C: Converter + ?Sized>(
    converter: Arc<C>,
    job: ConvertJob,
    options: ExecuteOptions,
    succeeded: &AtomicUsize,
) -> JobResult {
    let start = Instant::now();

    let outcome = match AssertUnwindSafe(run_job(converter.as_ref(), &job, &options))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("Job for {} panicked: {}", job.source.display(), message);
            if !options.dry_run {
                discard(&partial_path_for(&job.destination)).await;
            }
            JobOutcome::Failed(format!("worker panicked: {}", message))
        }
    };

    if outcome.is_success() {
        succeeded.fetch_add(1, Ordering::SeqCst);
    }

    JobResult {
        job,
        outcome,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

async fn run_job<C: Converter + ?Sized>(
    converter: &C,
    job: &ConvertJob,
    options: &ExecuteOptions,
) -> JobOutcome {
    if options.skip_if_up_to_date && is_up_to_date(&job.source, &job.destination).await {
        info!("Skipping {} (up to date)", job.destination.display());
        return JobOutcome::Skipped;
    }

    // No descriptor means transcode, whether smart copy is off or the probe failed.
    let streams = if options.smart_copy {
        probe_streams(converter, &job.source).await
    } else {
        None
    };

    if options.dry_run {
        let command = build_command(converter.config(), job, &job.destination, streams.as_ref());
        info!("[dry-run] {}", command);
        return JobOutcome::DryRun;
    }

    let partial = partial_path_for(&job.destination);
    let command = build_command(converter.config(), job, &partial, streams.as_ref());
    info!(
        "Converting: {} -> {}{}",
        job.source.display(),
        job.destination.display(),
        if command.is_stream_copy() { " (stream copy)" } else { "" }
    );

    let result = match converter.run(&command).await {
        Ok(()) => commit(&partial, &job.destination).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            info!("Committed {}", job.destination.display());
            JobOutcome::Committed
        }
        Err(e) => {
            discard(&partial).await;
            warn!("Conversion failed for {}: {}", job.source.display(), e);
            if let ConverterError::ConversionFailed {
                stderr: Some(ref stderr),
                ..
            } = e
            {
                debug!("ffmpeg stderr for {}:\n{}", job.source.display(), stderr);
            }
            JobOutcome::Failed(e.to_string())
        }
    }
}

/// Whether `destination` exists, is non-empty, and is not older than `source`.
pub async fn is_up_to_date(source: &Path, destination: &Path) -> bool {
    let (Ok(src), Ok(dst)) = (fs::metadata(source).await, fs::metadata(destination).await) else {
        return false;
    };
    if !dst.is_file() || dst.len() == 0 {
        return false;
    }
    match (src.modified(), dst.modified()) {
        (Ok(src_mtime), Ok(dst_mtime)) => dst_mtime >= src_mtime,
        _ => false,
    }
}

/// In-progress path for a destination: `clip.mp4` becomes `clip.part.mp4`.
///
/// The real extension stays last so the encoder still picks the right muxer.
pub fn partial_path_for(destination: &Path) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match destination.extension() {
        Some(ext) => format!("{}.{}.{}", stem, PARTIAL_MARKER, ext.to_string_lossy()),
        None => format!("{}.{}", stem, PARTIAL_MARKER),
    };
    destination.with_file_name(name)
}

/// Moves a finished partial output over the destination.
async fn commit(partial: &Path, destination: &Path) -> Result<(), ConverterError> {
    if fs::metadata(partial).await.is_err() {
        return Err(ConverterError::OutputMissing {
            path: partial.to_path_buf(),
        });
    }

    let first_attempt = fs::rename(partial, destination).await;
    let Err(e) = first_attempt else {
        return Ok(());
    };

    // Some platforms refuse to rename over an existing file.
    if !fs::try_exists(destination).await.unwrap_or(false) {
        return Err(e.into());
    }
    debug!("Replacing existing {} after: {}", destination.display(), e);
    if let Err(e) = fs::remove_file(destination).await {
        debug!("Could not remove {}: {}", destination.display(), e);
    }
    fs::rename(partial, destination).await?;
    Ok(())
}

/// Best-effort removal of a partial output.
async fn discard(partial: &Path) {
    match fs::remove_file(partial).await {
        Ok(()) => debug!("Removed partial output {}", partial.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => debug!("Could not remove partial output {}: {}", partial.display(), e),
    }
}

async fn ensure_output_dirs(jobs: &[ConvertJob]) {
    let dirs: BTreeSet<&Path> = jobs
        .iter()
        .filter_map(|job| job.destination.parent())
        .filter(|dir| !dir.as_os_str().is_empty())
        .collect();

    for dir in dirs {
        if let Err(e) = fs::create_dir_all(dir).await {
            warn!("Failed to create output directory {}: {}", dir.display(), e);
        }
    }
}
