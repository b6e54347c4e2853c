//! Sub-configuration structs with defaults.

use serde::{Deserialize, Serialize};

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Upper bound on concurrently running per-file pipelines
    pub parallel_workers: usize,

    /// Eligible input extensions (matched case-insensitively)
    pub extensions: Vec<String>,

    /// Default review root when none is given on the command line.
    /// `~` is expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_dir: Option<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            extensions: vec!["png".to_string()],
            review_dir: None,
        }
    }
}

/// External programs the pipeline shells out to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Metadata reader, invoked as `<program> -j <path>`
    pub metadata_reader: String,

    /// Encoder, invoked as `<program> <src> -quality <q> -define heic:compression=<c> <dst>`
    pub encoder: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            metadata_reader: "exiftool".to_string(),
            encoder: "magick".to_string(),
        }
    }
}

/// Encoder tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Quality level, 1-100
    pub quality: u8,

    /// Compression effort, 0-10
    pub compression: u8,

    /// Extension of the converted artifact
    pub output_extension: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            compression: 10,
            output_extension: "avif".to_string(),
        }
    }
}

/// Tag names the sidecar classifier looks for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MetadataConfig {
    /// Tag carrying an embedded node-graph/workflow (JSON)
    pub workflow_field: String,

    /// Tag carrying free-text generation parameters
    pub parameters_field: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            workflow_field: "Prompt".to_string(),
            parameters_field: "Parameters".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
