//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::types::SidecarKind;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.processing.extensions.is_empty()
            || self.processing.extensions.iter().any(|e| e.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "processing.extensions must list at least one non-empty extension".into(),
            ));
        }
        if self.tools.metadata_reader.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "tools.metadata_reader must not be empty".into(),
            ));
        }
        if self.tools.encoder.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "tools.encoder must not be empty".into(),
            ));
        }
        if !(1..=100).contains(&self.encoder.quality) {
            return Err(ConfigError::ValidationError(
                "encoder.quality must be between 1 and 100".into(),
            ));
        }
        if self.encoder.compression > 10 {
            return Err(ConfigError::ValidationError(
                "encoder.compression must be between 0 and 10".into(),
            ));
        }
        if self.encoder.output_extension.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "encoder.output_extension must not be empty".into(),
            ));
        }
        if self
            .processing
            .extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&self.encoder.output_extension))
        {
            return Err(ConfigError::ValidationError(
                "encoder.output_extension must differ from processing.extensions".into(),
            ));
        }
        if let Some(kind) = SidecarKind::ALL
            .iter()
            .find(|k| k.extension().eq_ignore_ascii_case(&self.encoder.output_extension))
        {
            return Err(ConfigError::ValidationError(format!(
                "encoder.output_extension must not be '{}', which sidecars use",
                kind.extension()
            )));
        }
        if self.metadata.workflow_field.is_empty() || self.metadata.parameters_field.is_empty() {
            return Err(ConfigError::ValidationError(
                "metadata field names must not be empty".into(),
            ));
        }
        if self.metadata.workflow_field == self.metadata.parameters_field {
            return Err(ConfigError::ValidationError(
                "metadata.workflow_field and metadata.parameters_field must differ".into(),
            ));
        }
        Ok(())
    }
}
