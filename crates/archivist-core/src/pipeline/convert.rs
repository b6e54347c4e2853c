//! Format conversion via an external encoder.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;

use crate::config::EncoderConfig;
use crate::error::PipelineError;

/// Anything that can turn a source image into an archival artifact.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Encoder name for logging.
    fn name(&self) -> &str;

    /// Encode `source` into `dest`. Must not modify or delete `source`.
    async fn encode(&self, source: &Path, dest: &Path) -> Result<(), PipelineError>;
}

/// Encodes with ImageMagick's `magick`.
pub struct MagickEncoder {
    program: String,
    quality: u8,
    compression: u8,
}

impl MagickEncoder {
    pub fn new(program: impl Into<String>, config: &EncoderConfig) -> Self {
        Self {
            program: program.into(),
            quality: config.quality,
            compression: config.compression,
        }
    }

    /// Build the encoder command line.
    pub fn build_command(&self, source: &Path, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(source)
            .arg("-quality")
            .arg(self.quality.to_string())
            .arg("-define")
            .arg(format!("heic:compression={}", self.compression))
            .arg(dest);
        cmd
    }
}

#[async_trait]
impl Encoder for MagickEncoder {
    fn name(&self) -> &str {
        &self.program
    }

    async fn encode(&self, source: &Path, dest: &Path) -> Result<(), PipelineError> {
        let output = self
            .build_command(source, dest)
            .output()
            .await
            .map_err(|e| PipelineError::Convert {
                path: source.to_path_buf(),
                message: format!("failed to launch {}: {e}", self.program),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(PipelineError::Convert {
                path: source.to_path_buf(),
                message: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                ),
            })
        }
    }
}

/// Runs an [`Encoder`] and verifies the artifact landed on disk.
#[derive(Clone)]
pub struct FormatConverter {
    encoder: Arc<dyn Encoder>,
}

impl FormatConverter {
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        Self { encoder }
    }

    /// Convert `source` to `dest`.
    ///
    /// Success requires both a successful encoder run and an existing file at
    /// `dest`. The artifact's contents are not inspected.
    pub async fn convert(&self, source: &Path, dest: &Path) -> Result<(), PipelineError> {
        self.encoder.encode(source, dest).await?;

        match tokio::fs::try_exists(dest).await {
            Ok(true) => {
                tracing::debug!("{} wrote {:?}", self.encoder.name(), dest);
                Ok(())
            }
            _ => Err(PipelineError::MissingArtifact {
                path: dest.to_path_buf(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    struct NoOutputEncoder;

    #[async_trait]
    impl Encoder for NoOutputEncoder {
        fn name(&self) -> &str {
            "no-output"
        }

        async fn encode(&self, _source: &Path, _dest: &Path) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    fn command_args(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .filter_map(|arg| arg.to_str().map(String::from))
            .collect()
    }

    #[test]
    fn test_build_command_shape() {
        let encoder = MagickEncoder::new("magick", &EncoderConfig::default());
        let cmd = encoder.build_command(Path::new("/in/a.png"), Path::new("/in/a.avif"));

        assert_eq!(cmd.as_std().get_program(), OsStr::new("magick"));
        assert_eq!(
            command_args(&cmd),
            vec![
                "/in/a.png",
                "-quality",
                "90",
                "-define",
                "heic:compression=10",
                "/in/a.avif"
            ]
        );
    }

    #[test]
    fn test_build_command_uses_tunables() {
        let config = EncoderConfig {
            quality: 55,
            compression: 3,
            ..Default::default()
        };
        let encoder = MagickEncoder::new("/opt/bin/magick", &config);
        let args = command_args(&encoder.build_command(Path::new("a.png"), Path::new("a.avif")));

        assert!(args.windows(2).any(|w| w[0] == "-quality" && w[1] == "55"));
        assert!(args.contains(&"heic:compression=3".to_string()));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_conversion_error() {
        let encoder = MagickEncoder::new("archivist-test-no-such-encoder", &EncoderConfig::default());
        let err = encoder
            .encode(Path::new("/nonexistent/a.png"), Path::new("/nonexistent/a.avif"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Convert { .. }));
    }

    #[tokio::test]
    async fn test_success_without_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let converter = FormatConverter::new(Arc::new(NoOutputEncoder));

        let err = converter
            .convert(&dir.path().join("a.png"), &dir.path().join("a.avif"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingArtifact { .. }));
    }
}
