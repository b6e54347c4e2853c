//! Archivist Core - batch archiving of generated images.
//!
//! Archivist walks a scan root for source images, saves the generation
//! metadata embedded in each one as a sidecar file, encodes an archival copy,
//! and moves the verified original into a parallel review tree.
//!
//! # Architecture
//!
//! ```text
//! Discover → Extract metadata → Write sidecar → Convert → Relocate original
//! ```
//!
//! Metadata reading and encoding go through the [`MetadataReader`] and
//! [`Encoder`] traits. The defaults shell out to `exiftool` and `magick`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use archivist_core::{Archiver, BatchRoots, Config, StopSignal};
//!
//! #[tokio::main]
//! async fn main() -> archivist_core::Result<()> {
//!     let config = Config::load()?;
//!     let roots = BatchRoots::resolve("./renders".as_ref(), None)?;
//!     let archiver = Archiver::new(config, roots)?;
//!
//!     let files = archiver.discover();
//!     let summary = archiver.run(files, &StopSignal::new(), |_, _| {}).await?;
//!     println!("{} succeeded, {} failed", summary.succeeded, summary.failed());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod preflight;
pub mod types;

use std::sync::Arc;

pub use config::Config;
pub use error::{ArchiveError, ConfigError, PipelineError, PipelineResult, PreflightError, Result};
pub use pipeline::{
    BatchRunner, Encoder, ExifToolReader, FileDiscovery, FilePipeline, MagickEncoder,
    MetadataReader, Progress, StopSignal,
};
pub use preflight::{check_tools, BatchRoots, ResolvedTools};
pub use types::{
    BatchSummary, FileReport, ImageRecord, MetadataMap, MetadataValue, Outcome, SidecarFile,
    SidecarKind,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Batch archiver - the main entry point.
pub struct Archiver {
    config: Config,
    pipeline: Arc<FilePipeline>,
}

impl Archiver {
    /// Create an archiver backed by the configured external tools.
    ///
    /// Fails if the configuration is invalid or either tool is not on `PATH`.
    pub fn new(config: Config, roots: BatchRoots) -> Result<Self> {
        config.validate()?;
        let tools = check_tools(&config.tools)?;
        tracing::debug!(
            "Using reader {:?} and encoder {:?}",
            tools.metadata_reader,
            tools.encoder
        );

        let reader = Arc::new(ExifToolReader::new(config.tools.metadata_reader.clone()));
        let encoder = Arc::new(MagickEncoder::new(
            config.tools.encoder.clone(),
            &config.encoder,
        ));
        Self::with_tools(config, roots, reader, encoder)
    }

    /// Create an archiver with caller-supplied reader and encoder.
    pub fn with_tools(
        config: Config,
        roots: BatchRoots,
        reader: Arc<dyn MetadataReader>,
        encoder: Arc<dyn Encoder>,
    ) -> Result<Self> {
        config.validate()?;
        tracing::debug!("Initializing Archivist v{}", VERSION);

        let pipeline = Arc::new(FilePipeline::new(&config, roots, reader, encoder));
        Ok(Self { config, pipeline })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn roots(&self) -> &BatchRoots {
        self.pipeline.roots()
    }

    /// Snapshot the eligible images under the scan root.
    pub fn discover(&self) -> Vec<ImageRecord> {
        FileDiscovery::new(self.config.processing.clone()).discover(&self.roots().scan)
    }

    /// Process `files` with bounded concurrency.
    ///
    /// Only a failure to create the review root is returned as an error; every
    /// per-file failure is counted in the summary instead.
    pub async fn run<F>(
        &self,
        files: Vec<ImageRecord>,
        stop: &StopSignal,
        on_report: F,
    ) -> Result<BatchSummary>
    where
        F: FnMut(&FileReport, Progress),
    {
        self.roots().ensure_review_root()?;

        let runner = BatchRunner::new(
            self.pipeline.clone(),
            self.config.processing.parallel_workers,
        );
        let summary = runner.run(files, stop, on_report).await;

        tracing::info!(
            "Batch finished: {} succeeded, {} conversion failure(s), {} error(s), {} not started in {:.1}s",
            summary.succeeded,
            summary.conversion_failed,
            summary.errored,
            summary.not_started,
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    /// Discover and process everything under the scan root.
    pub async fn run_batch(&self, stop: &StopSignal) -> Result<BatchSummary> {
        let files = self.discover();
        tracing::info!("Found {} image(s) to archive", files.len());
        self.run(files, stop, |_, _| {}).await
    }
}
