//! Moving processed originals into the review tree.
//!
//! A relocation either leaves the file fully at its destination or fully at
//! its source. Same-filesystem moves are a single rename; cross-device moves
//! copy to a hidden temporary next to the destination, rename it into place,
//! then remove the source, rolling the copy back if the source cannot go.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{PipelineError, PipelineResult};

/// Compute where `source` lands under `review_root`.
pub fn review_destination(
    source: &Path,
    scan_root: &Path,
    review_root: &Path,
) -> PipelineResult<PathBuf> {
    let relative = source
        .strip_prefix(scan_root)
        .map_err(|_| PipelineError::OutsideScanRoot {
            path: source.to_path_buf(),
            root: scan_root.to_path_buf(),
        })?;
    Ok(review_root.join(relative))
}

/// Move `source` to `review_root/<path relative to scan_root>`.
///
/// Refuses to replace an existing destination. Returns the final path.
pub async fn relocate(
    source: &Path,
    scan_root: &Path,
    review_root: &Path,
) -> PipelineResult<PathBuf> {
    let dest = review_destination(source, scan_root, review_root)?;
    let fail = |source_err: io::Error| PipelineError::Relocate {
        from: source.to_path_buf(),
        to: dest.clone(),
        source: source_err,
    };

    if fs::try_exists(&dest).await.map_err(fail)? {
        return Err(PipelineError::RelocateDestinationExists { path: dest.clone() });
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await.map_err(fail)?;
    }

    match fs::rename(source, &dest).await {
        Ok(()) => {}
        Err(e) if is_cross_device(&e) => {
            tracing::debug!("Cross-device move for {:?}; copying", source);
            move_across_devices(source, &dest).await.map_err(fail)?;
        }
        Err(e) => return Err(fail(e)),
    }

    tracing::info!("Moved {:?} -> {:?}", source, dest);
    Ok(dest)
}

fn is_cross_device(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices
}

/// Copy + delete fallback for moves between filesystems.
async fn move_across_devices(source: &Path, dest: &Path) -> io::Result<()> {
    let staging = staging_path(dest);

    if let Err(e) = fs::copy(source, &staging).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e);
    }
    if let Err(e) = fs::rename(&staging, dest).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e);
    }
    if let Err(e) = fs::remove_file(source).await {
        // Roll back so the file exists in exactly one place.
        let _ = fs::remove_file(dest).await;
        return Err(e);
    }
    Ok(())
}

/// Hidden sibling used while a cross-device copy is in flight.
fn staging_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.partial"))
}
