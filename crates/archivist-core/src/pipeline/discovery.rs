//! File discovery: a one-shot snapshot of eligible images under the scan root.

use std::path::Path;
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::types::ImageRecord;

/// Discovers image files in a directory tree.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Recursively find every eligible file under `root`.
    ///
    /// The result is a snapshot: files created after the walk are not seen.
    /// Symlinks are not followed, so a link cannot pull files from outside the
    /// root into the batch. Unreadable entries are logged and skipped.
    pub fn discover(&self, root: &Path) -> Vec<ImageRecord> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry during discovery: {e}");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.is_supported(entry.path()) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

            files.push(ImageRecord {
                path: entry.path().to_path_buf(),
                relative: relative.to_path_buf(),
                size,
            });
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[ImageRecord]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
