//! Per-file pipeline: extract -> sidecar -> convert -> relocate.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::convert::{Encoder, FormatConverter};
use super::metadata::{MetadataExtractor, MetadataReader};
use super::paths::artifact_path;
use super::relocate::relocate;
use super::sidecar::SidecarWriter;
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::preflight::BatchRoots;
use crate::types::{FileReport, ImageRecord, Outcome};

/// Runs one image through every stage, strictly in order.
///
/// Holds only read-only state, so one instance is shared by every worker.
pub struct FilePipeline {
    extractor: MetadataExtractor,
    sidecars: SidecarWriter,
    converter: FormatConverter,
    output_extension: String,
    roots: BatchRoots,
    artifacts: ArtifactClaims,
}

/// Artifact paths owned by in-flight or finished files.
///
/// `x.png` and `x.jpg` both map to `x.avif`; only the first to claim it may
/// encode, so one image's archival copy can never replace another's.
#[derive(Debug, Default)]
struct ArtifactClaims(Mutex<HashSet<PathBuf>>);

impl ArtifactClaims {
    fn claim(&self, path: &Path) -> PipelineResult<()> {
        let taken = || PipelineError::ArtifactTaken {
            path: path.to_path_buf(),
        };
        let mut claimed = self.0.lock().map_err(|_| taken())?;
        if path.exists() || !claimed.insert(path.to_path_buf()) {
            return Err(taken());
        }
        Ok(())
    }

    fn release(&self, path: &Path) {
        if let Ok(mut claimed) = self.0.lock() {
            claimed.remove(path);
        }
    }
}

impl FilePipeline {
    pub fn new(
        config: &Config,
        roots: BatchRoots,
        reader: Arc<dyn MetadataReader>,
        encoder: Arc<dyn Encoder>,
    ) -> Self {
        Self {
            extractor: MetadataExtractor::new(reader),
            sidecars: SidecarWriter::new(config.metadata.clone()),
            converter: FormatConverter::new(encoder),
            output_extension: config.encoder.output_extension.clone(),
            roots,
            artifacts: ArtifactClaims::default(),
        }
    }

    pub fn roots(&self) -> &BatchRoots {
        &self.roots
    }

    /// Process one image. Never returns an error; every failure becomes an
    /// [`Outcome`].
    ///
    /// The original is relocated only after a verified conversion. A failed
    /// conversion leaves it in the scan tree so a re-run picks it up again.
    /// A file whose artifact path is already taken is not touched at all.
    pub async fn process(&self, record: &ImageRecord) -> FileReport {
        let start = Instant::now();
        let path = &record.path;
        tracing::debug!("Processing: {:?}", path);

        let artifact = artifact_path(path, &self.output_extension);
        if let Err(e) = self.artifacts.claim(&artifact) {
            tracing::error!("{e}; {:?} left untouched", path);
            return FileReport {
                path: path.clone(),
                sidecar: None,
                outcome: Outcome::ProcessingError(e.to_string()),
            };
        }

        let metadata = self.extractor.extract(path).await;
        tracing::trace!("  Metadata: {:?}", start.elapsed());

        let sidecar = self.sidecars.classify_and_write(path, &metadata).await;
        tracing::trace!("  Sidecar: {:?}", start.elapsed());

        let outcome = match self.converter.convert(path, &artifact).await {
            Err(e) => {
                self.artifacts.release(&artifact);
                tracing::warn!("{e}; original left in place");
                Outcome::ConversionFailed(e.to_string())
            }
            Ok(()) => match relocate(path, &self.roots.scan, &self.roots.review).await {
                Ok(_) => Outcome::Success,
                Err(e) => {
                    tracing::error!(
                        "Converted {:?} but could not move the original: {e}",
                        path
                    );
                    Outcome::ProcessingError(format!("converted but not relocated: {e}"))
                }
            },
        };

        tracing::debug!("Finished {:?} in {:?}: {}", path, start.elapsed(), outcome);

        FileReport {
            path: path.clone(),
            sidecar,
            outcome,
        }
    }
}
