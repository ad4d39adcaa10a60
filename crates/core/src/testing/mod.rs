//! Testing utilities and mock implementations.
//!
//! This module provides a mock [`Converter`](crate::converter::Converter) and
//! small fixture helpers, allowing the planner and executor to be tested
//! without FFmpeg installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use eyn_core::testing::{fixtures, MockConverter};
//!
//! let converter = MockConverter::new();
//! let source = fixtures::media_file(dir.path(), "clip.mov")?;
//! let jobs = plan_conversions(&converter, &source, ConvertSettings::new("mp4")).await?;
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedRun, PARTIAL_BYTES};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime};

    /// Create a small fake media file, creating parent directories as needed.
    pub fn media_file(dir: &Path, name: &str) -> io::Result<PathBuf> {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, format!("source:{}", name))?;
        Ok(path)
    }

    /// Push a file's modification time into the past.
    pub fn age_file(path: &Path, by: Duration) -> io::Result<()> {
        let time = SystemTime::now() - by;
        std::fs::File::options()
            .write(true)
            .open(path)?
            .set_modified(time)
    }
}
