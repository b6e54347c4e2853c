//! Output path derivation and collision-free path allocation.

use std::path::{Path, PathBuf};

/// Return `desired` if nothing exists there, otherwise the first free
/// `<stem>_<n>.<ext>` sibling for n = 1, 2, ...
///
/// Only checks; never creates. The caller creates the file right after, which
/// is safe within one batch because each worker only allocates paths derived
/// from its own image's stem.
pub fn allocate_unique(desired: &Path) -> PathBuf {
    if !desired.exists() {
        return desired.to_path_buf();
    }

    let stem = desired
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = desired.extension().map(|e| e.to_string_lossy().into_owned());

    let mut counter: u64 = 1;
    loop {
        let file_name = match &extension {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        let candidate = desired.with_file_name(file_name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Path of the converted artifact for `source`: same stem, new extension.
pub fn artifact_path(source: &Path, extension: &str) -> PathBuf {
    source.with_extension(extension)
}
