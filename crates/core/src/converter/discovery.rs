//! Input file discovery.

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// System files that are never media.
const JUNK_FILES: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "ehthumbs.db",
    "desktop.ini",
    "Desktop.ini",
    "Icon\r",
];

/// Whether a file name is hidden or on the junk list.
pub fn is_ignored_name(name: &str) -> bool {
    name.starts_with('.') || JUNK_FILES.contains(&name)
}

fn is_ignored(entry: &DirEntry) -> bool {
    // The root itself is never filtered, even if it is a dot-directory.
    entry.depth() > 0 && is_ignored_name(&entry.file_name().to_string_lossy())
}

/// Lists the regular files to convert under `root`.
///
/// A file root yields itself. A directory root yields its files (recursively
/// when asked), sorted by name at every level so repeated runs agree.
/// Hidden entries are skipped and hidden directories are not entered.
/// Symlinks are followed; broken links and loops are logged and skipped.
pub fn discover_files(root: &Path, recursive: bool) -> impl Iterator<Item = PathBuf> {
    let max_depth = if root.is_file() {
        0
    } else if recursive {
        usize::MAX
    } else {
        1
    };

    WalkDir::new(root)
        .follow_links(true)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
}
