//! Metadata classification and sidecar writing.
//!
//! At most one sidecar is written per image. The workflow tag wins over the
//! parameters tag; a workflow payload that is not valid JSON is still written
//! verbatim to a `.json` sidecar rather than dropped.

use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::paths::allocate_unique;
use crate::config::MetadataConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{MetadataMap, MetadataValue, SidecarFile, SidecarKind};

/// Attempts at allocate-then-create before giving up on a contended name.
const CREATE_ATTEMPTS: usize = 8;

/// What, if anything, should be written for one image.
#[derive(Debug, Clone, PartialEq)]
pub enum SidecarPlan {
    /// Workflow payload parsed as JSON
    Workflow(serde_json::Value),
    /// Workflow payload that did not parse; kept as-is
    RawWorkflow { raw: String, parse_error: String },
    /// Free-text generation parameters
    Parameters(String),
    /// Neither known tag present
    Nothing,
}

impl SidecarPlan {
    /// Decide the sidecar for `metadata`. First match wins.
    pub fn classify(metadata: &MetadataMap, fields: &MetadataConfig) -> Self {
        if let Some(value) = metadata.get(&fields.workflow_field) {
            return match value {
                MetadataValue::Text(raw) => match serde_json::from_str(raw) {
                    Ok(parsed) => Self::Workflow(parsed),
                    Err(e) => Self::RawWorkflow {
                        raw: raw.clone(),
                        parse_error: e.to_string(),
                    },
                },
                MetadataValue::Structured(value) => Self::Workflow(value.clone()),
            };
        }

        if let Some(value) = metadata.get(&fields.parameters_field) {
            return Self::Parameters(value.as_raw_text());
        }

        Self::Nothing
    }

    /// Kind of sidecar this plan produces, if any.
    pub fn kind(&self) -> Option<SidecarKind> {
        match self {
            Self::Workflow(_) => Some(SidecarKind::Workflow),
            Self::RawWorkflow { .. } => Some(SidecarKind::RawWorkflow),
            Self::Parameters(_) => Some(SidecarKind::Parameters),
            Self::Nothing => None,
        }
    }

    fn contents(&self) -> Option<String> {
        match self {
            Self::Workflow(value) => Some(to_pretty_json(value)),
            Self::RawWorkflow { raw, .. } => Some(raw.clone()),
            Self::Parameters(text) => Some(text.clone()),
            Self::Nothing => None,
        }
    }
}

/// Pretty-print with four-space indentation, non-ASCII kept verbatim.
fn to_pretty_json(value: &serde_json::Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    // Serializing a Value into memory cannot fail.
    let _ = value.serialize(&mut serializer);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Classifies metadata and writes the resulting sidecar next to the image.
#[derive(Debug, Clone)]
pub struct SidecarWriter {
    fields: MetadataConfig,
}

impl SidecarWriter {
    pub fn new(fields: MetadataConfig) -> Self {
        Self { fields }
    }

    /// Classify and write, logging instead of failing.
    ///
    /// A write failure does not stop the pipeline; the image is still converted.
    pub async fn classify_and_write(
        &self,
        image: &Path,
        metadata: &MetadataMap,
    ) -> Option<SidecarFile> {
        let plan = SidecarPlan::classify(metadata, &self.fields);
        if let SidecarPlan::RawWorkflow { parse_error, .. } = &plan {
            tracing::warn!(
                "{} tag in {:?} is not valid JSON ({parse_error}); writing it verbatim",
                self.fields.workflow_field,
                image
            );
        }

        match self.write(image, &plan).await {
            Ok(Some(sidecar)) => {
                tracing::info!("Sidecar saved: {:?}", sidecar.path);
                Some(sidecar)
            }
            Ok(None) => {
                tracing::info!(
                    "No '{}' or '{}' found for: {:?}",
                    self.fields.workflow_field,
                    self.fields.parameters_field,
                    image
                );
                None
            }
            Err(e) => {
                tracing::error!("{e}");
                None
            }
        }
    }

    /// Write the sidecar described by `plan`.
    pub async fn write(
        &self,
        image: &Path,
        plan: &SidecarPlan,
    ) -> PipelineResult<Option<SidecarFile>> {
        let (Some(kind), Some(contents)) = (plan.kind(), plan.contents()) else {
            return Ok(None);
        };

        let natural = image.with_extension(kind.extension());
        let path = create_unique(&natural, contents.as_bytes()).await?;
        Ok(Some(SidecarFile { path, kind }))
    }
}

/// Allocate a free name for `natural` and create it with `create_new`, so an
/// existing file is never overwritten even if the name is taken in between.
async fn create_unique(natural: &Path, contents: &[u8]) -> PipelineResult<std::path::PathBuf> {
    let mut last_err = None;

    for _ in 0..CREATE_ATTEMPTS {
        let candidate = allocate_unique(natural);
        let opened = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await;

        match opened {
            Ok(mut file) => {
                let written = async {
                    file.write_all(contents).await?;
                    file.flush().await
                }
                .await;
                return match written {
                    Ok(()) => Ok(candidate),
                    Err(source) => Err(PipelineError::SidecarWrite {
                        path: candidate,
                        source,
                    }),
                };
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => last_err = Some(e),
            Err(source) => {
                return Err(PipelineError::SidecarWrite {
                    path: candidate,
                    source,
                })
            }
        }
    }

    Err(PipelineError::SidecarWrite {
        path: natural.to_path_buf(),
        source: last_err.unwrap_or_else(|| std::io::Error::from(ErrorKind::AlreadyExists)),
    })
}
