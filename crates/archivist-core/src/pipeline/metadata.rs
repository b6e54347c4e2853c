//! Embedded metadata extraction via an external reader.
//!
//! The reader itself is a capability ([`MetadataReader`]) so tests can plug in
//! deterministic fakes. [`MetadataExtractor`] wraps it with the lenient
//! contract the pipeline relies on: failures degrade to an empty map.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;

use crate::error::PipelineError;
use crate::types::MetadataMap;

/// Key the reader adds to every record; not part of the image's own tags.
const SOURCE_FILE_KEY: &str = "SourceFile";

/// Anything that can produce a tag map for one image.
///
/// Held as `Arc<dyn MetadataReader>`, hence `async_trait`.
#[async_trait]
pub trait MetadataReader: Send + Sync {
    /// Reader name for logging.
    fn name(&self) -> &str;

    /// Read all tags from `path`.
    async fn read(&self, path: &Path) -> Result<MetadataMap, PipelineError>;
}

/// Reads metadata by running `exiftool -j <path>`.
pub struct ExifToolReader {
    program: String,
}

impl ExifToolReader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl MetadataReader for ExifToolReader {
    fn name(&self) -> &str {
        &self.program
    }

    async fn read(&self, path: &Path) -> Result<MetadataMap, PipelineError> {
        let output = Command::new(&self.program)
            .arg("-j")
            .arg(path)
            .output()
            .await
            .map_err(|e| PipelineError::Extract {
                path: path.to_path_buf(),
                message: format!("failed to launch {}: {e}", self.program),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Extract {
                path: path.to_path_buf(),
                message: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                ),
            });
        }

        parse_reader_output(&output.stdout).map_err(|message| PipelineError::Extract {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// Parse the reader's JSON output: an array holding one object per file.
pub fn parse_reader_output(stdout: &[u8]) -> Result<MetadataMap, String> {
    let mut records: Vec<MetadataMap> =
        serde_json::from_slice(stdout).map_err(|e| format!("malformed reader output: {e}"))?;

    if records.is_empty() {
        return Ok(MetadataMap::new());
    }

    let mut record = records.swap_remove(0);
    record.shift_remove(SOURCE_FILE_KEY);
    Ok(record)
}

/// Lenient wrapper around a [`MetadataReader`].
#[derive(Clone)]
pub struct MetadataExtractor {
    reader: Arc<dyn MetadataReader>,
}

impl MetadataExtractor {
    pub fn new(reader: Arc<dyn MetadataReader>) -> Self {
        Self { reader }
    }

    /// Extract tags from `path`.
    ///
    /// Never fails: any reader error is logged and yields an empty map, so the
    /// file still proceeds to conversion.
    pub async fn extract(&self, path: &Path) -> MetadataMap {
        match self.reader.read(path).await {
            Ok(map) => {
                tracing::debug!("{} read {} tag(s) from {:?}", self.reader.name(), map.len(), path);
                map
            }
            Err(e) => {
                tracing::warn!("{e}; continuing without metadata");
                MetadataMap::new()
            }
        }
    }
}
