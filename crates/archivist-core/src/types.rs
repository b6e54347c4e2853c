//! Core data types flowing through the Archivist pipeline.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One discovered image, owned by exactly one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Absolute path to the source file
    pub path: PathBuf,

    /// Path relative to the scan root
    pub relative: PathBuf,

    /// File size in bytes at discovery time
    pub size: u64,
}

/// A single metadata value as reported by the metadata reader.
///
/// The reader emits strings for most tags, but numeric and nested values come
/// through as-is so nothing is lost before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Plain string value
    Text(String),
    /// Any non-string JSON value
    Structured(serde_json::Value),
}

impl MetadataValue {
    /// Render the value as the raw text that would be written to a sidecar.
    pub fn as_raw_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => value.to_string(),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Tag name to value mapping for one image, in the order the reader
/// reported the tags. May be empty.
pub type MetadataMap = IndexMap<String, MetadataValue>;

/// Which kind of sidecar was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidecarKind {
    /// Workflow payload that parsed as JSON, written pretty-printed
    Workflow,
    /// Workflow payload that failed to parse, written verbatim to `.json`
    RawWorkflow,
    /// Free-text generation parameters, written to `.txt`
    Parameters,
}

impl SidecarKind {
    pub const ALL: [SidecarKind; 3] = [Self::Workflow, Self::RawWorkflow, Self::Parameters];

    /// File extension for this sidecar kind.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Workflow | Self::RawWorkflow => "json",
            Self::Parameters => "txt",
        }
    }
}

/// A sidecar file written next to a source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarFile {
    /// Final path after collision avoidance
    pub path: PathBuf,
    /// What the sidecar contains
    pub kind: SidecarKind,
}

/// Terminal result for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Converted and the original moved to the review root
    Success,
    /// Encoder failed; the original stays in the scan tree
    ConversionFailed(String),
    /// Anything else, including a failed relocation after a good conversion
    ProcessingError(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::ConversionFailed(reason) => write!(f, "conversion failed: {reason}"),
            Self::ProcessingError(reason) => write!(f, "processing error: {reason}"),
        }
    }
}

/// Per-file report delivered to the batch aggregator.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Source path as discovered
    pub path: PathBuf,
    /// Sidecar written for this file, if any
    pub sidecar: Option<SidecarFile>,
    /// Terminal outcome
    pub outcome: Outcome,
}

/// Aggregate counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files found by discovery
    pub discovered: usize,
    /// Converted and relocated
    pub succeeded: usize,
    /// Left in place because conversion failed
    pub conversion_failed: usize,
    /// Any other per-file failure
    pub errored: usize,
    /// Never dispatched because the batch was stopped
    pub not_started: usize,
    /// Wall-clock time for the batch
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Count one terminal outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Success => self.succeeded += 1,
            Outcome::ConversionFailed(_) => self.conversion_failed += 1,
            Outcome::ProcessingError(_) => self.errored += 1,
        }
    }

    /// Files that reached a terminal outcome.
    pub fn processed(&self) -> usize {
        self.succeeded + self.conversion_failed + self.errored
    }

    /// Files that reached a non-success outcome.
    pub fn failed(&self) -> usize {
        self.conversion_failed + self.errored
    }
}
