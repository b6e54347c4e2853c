//! Error types for the Archivist batch pipeline.
//!
//! Errors are split by blast radius: configuration and pre-flight errors abort
//! a run before any file is touched, while pipeline errors are always scoped to
//! a single image and carry its path.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Archivist operations.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pre-flight check failures (missing tools, bad roots)
    #[error("Pre-flight check failed: {0}")]
    Preflight(#[from] PreflightError),

    /// Per-file pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors that stop a run before the first file is dispatched.
#[derive(Error, Debug)]
pub enum PreflightError {
    /// An external tool could not be resolved on `PATH`
    #[error("Required tool '{tool}' was not found on PATH")]
    ToolMissing { tool: String },

    /// The scan root does not exist or is not a directory
    #[error("Scan root is not a directory: {0}")]
    ScanRootNotDirectory(PathBuf),

    /// Scan and review roots contain one another
    #[error("Review root {review} overlaps scan root {scan}")]
    OverlappingRoots { scan: PathBuf, review: PathBuf },

    /// The review root could not be created
    #[error("Failed to create review root {path}: {source}")]
    ReviewRootCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Metadata reader failed or produced unusable output
    #[error("Metadata extraction failed for {path}: {message}")]
    Extract { path: PathBuf, message: String },

    /// Sidecar file could not be written
    #[error("Failed to write sidecar {path}: {source}")]
    SidecarWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoder failed to launch or exited unsuccessfully
    #[error("Conversion failed for {path}: {message}")]
    Convert { path: PathBuf, message: String },

    /// Encoder reported success but left no artifact behind
    #[error("Encoder reported success but {path} does not exist")]
    MissingArtifact { path: PathBuf },

    /// Another file already owns the artifact path, or it exists on disk
    #[error("Artifact path {path} is already taken; refusing to overwrite it")]
    ArtifactTaken { path: PathBuf },

    /// Relocation target is already occupied
    #[error("Relocation destination already exists: {path}")]
    RelocateDestinationExists { path: PathBuf },

    /// Relocation I/O failed; the source is left in place
    #[error("Failed to move {from} to {to}: {source}")]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source path is not under the scan root
    #[error("{path} is not inside scan root {root}")]
    OutsideScanRoot { path: PathBuf, root: PathBuf },
}

/// Convenience type alias for Archivist results.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
