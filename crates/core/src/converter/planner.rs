//! Conversion planning.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::discovery::discover_files;
use super::error::ConverterError;
use super::executor::partial_path_for;
use super::traits::Converter;
use super::types::{ConvertJob, ConvertSettings};

/// Infix inserted when a destination would overwrite a source or another
/// job's output. Repeated collisions append a counter (`conv2`, `conv3`, ...).
pub const COLLISION_MARKER: &str = "conv";

/// Turns an input path into an ordered list of jobs.
///
/// Checks the external tools once, discovers inputs, and resolves one
/// destination per input. No files are created or opened.
///
/// Destinations are unique within the plan and never land on any planned
/// source, so no job reads or writes a path another job owns.
pub async fn plan_conversions<C: Converter + ?Sized>(
    converter: &C,
    root: &Path,
    settings: ConvertSettings,
) -> Result<Vec<ConvertJob>, ConverterError> {
    converter.validate().await?;

    let files: Vec<PathBuf> = discover_files(root, settings.recursive).collect();
    if files.is_empty() {
        return Err(ConverterError::NoInputFiles {
            path: root.to_path_buf(),
        });
    }

    let ext = settings.target_extension();
    let settings = Arc::new(settings);
    let mut claims = PathClaims::new(&files);
    let jobs: Vec<ConvertJob> = files
        .into_iter()
        .map(|source| {
            let destination = claims.claim(&source, settings.output_dir.as_deref(), &ext);
            debug!("Planned {} -> {}", source.display(), destination.display());
            ConvertJob {
                source,
                destination,
                settings: Arc::clone(&settings),
            }
        })
        .collect();

    info!("Planned {} conversion(s) to .{} from {}", jobs.len(), ext, root.display());
    Ok(jobs)
}

/// Destination for `source`: same stem, new extension, in `output_dir` or
/// beside the source. Never resolves to the source itself.
pub fn destination_for(source: &Path, output_dir: Option<&Path>, ext: &str) -> PathBuf {
    PathClaims::new(std::slice::from_ref(&source.to_path_buf())).claim(source, output_dir, ext)
}

/// Paths already spoken for while planning one batch, compared resolved.
struct PathClaims {
    sources: HashSet<PathBuf>,
    outputs: HashSet<PathBuf>,
}

impl PathClaims {
    fn new(sources: &[PathBuf]) -> Self {
        Self {
            sources: sources.iter().map(|s| resolve(s)).collect(),
            outputs: HashSet::new(),
        }
    }

    /// Picks the first free name and reserves it along with its partial path.
    fn claim(&mut self, source: &Path, output_dir: Option<&Path>, ext: &str) -> PathBuf {
        let parent = output_dir
            .map(Path::to_path_buf)
            .or_else(|| source.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let stem = source.file_stem().map(OsString::from).unwrap_or_default();

        let mut attempt: usize = 0;
        loop {
            let infix = match attempt {
                0 => None,
                1 => Some(COLLISION_MARKER.to_string()),
                n => Some(format!("{}{}", COLLISION_MARKER, n)),
            };
            let candidate = parent.join(with_extension(&stem, infix.as_deref(), ext));
            let resolved = resolve(&candidate);
            let partial = resolve(&partial_path_for(&candidate));

            if self.is_free(&resolved) && self.is_free(&partial) {
                if attempt > 0 {
                    info!(
                        "{} would collide with another file in this batch, writing {}",
                        source.display(),
                        candidate.display()
                    );
                }
                self.outputs.insert(resolved);
                self.outputs.insert(partial);
                return candidate;
            }
            attempt += 1;
        }
    }

    fn is_free(&self, resolved: &Path) -> bool {
        !self.sources.contains(resolved) && !self.outputs.contains(resolved)
    }
}

fn with_extension(stem: &OsString, infix: Option<&str>, ext: &str) -> OsString {
    let mut name = stem.clone();
    if let Some(infix) = infix {
        name.push(".");
        name.push(infix);
    }
    if !ext.is_empty() {
        name.push(".");
        name.push(ext);
    }
    name
}

fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    // Not on disk yet: resolve the parent and keep the file name.
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent
                .canonicalize()
                .map(|p| p.join(name))
                .unwrap_or_else(|_| std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()))
        }
        _ => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}
