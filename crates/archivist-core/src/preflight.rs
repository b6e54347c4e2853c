//! Pre-flight checks run before any file is touched.
//!
//! - Both external tools must resolve on `PATH`
//! - The scan root must be an existing directory
//! - Scan and review roots must not contain one another

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::config::ToolsConfig;
use crate::error::PreflightError;

/// Absolute paths of the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTools {
    pub metadata_reader: PathBuf,
    pub encoder: PathBuf,
}

/// Resolve both configured tools or fail with the first missing one.
pub fn check_tools(tools: &ToolsConfig) -> Result<ResolvedTools, PreflightError> {
    Ok(ResolvedTools {
        metadata_reader: find_tool(&tools.metadata_reader)?,
        encoder: find_tool(&tools.encoder)?,
    })
}

/// Locate an executable the way a shell would: a bare name is searched on
/// `PATH`, a name with a separator is checked directly.
pub fn find_tool(program: &str) -> Result<PathBuf, PreflightError> {
    which::which(program).map_err(|e| {
        tracing::debug!("Lookup of {program:?} failed: {e}");
        PreflightError::ToolMissing {
            tool: program.to_string(),
        }
    })
}

/// Scan and review roots for one run, both absolute and normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRoots {
    pub scan: PathBuf,
    pub review: PathBuf,
}

impl BatchRoots {
    /// Validate and normalize the roots.
    ///
    /// Without an explicit review root, `<scan>_review` next to the scan root
    /// is used.
    pub fn resolve(scan: &Path, review: Option<&Path>) -> Result<Self, PreflightError> {
        let scan = match std::fs::canonicalize(scan) {
            Ok(path) if path.is_dir() => path,
            _ => return Err(PreflightError::ScanRootNotDirectory(scan.to_path_buf())),
        };

        let review = match review {
            Some(path) => normalize(path),
            None => default_review_root(&scan),
        };

        if review.starts_with(&scan) || scan.starts_with(&review) {
            return Err(PreflightError::OverlappingRoots { scan, review });
        }

        Ok(Self { scan, review })
    }

    /// Create the review root (and parents) if missing.
    pub fn ensure_review_root(&self) -> Result<(), PreflightError> {
        std::fs::create_dir_all(&self.review).map_err(|source| PreflightError::ReviewRootCreate {
            path: self.review.clone(),
            source,
        })
    }
}

/// Sibling directory `<scan name>_review`.
pub fn default_review_root(scan: &Path) -> PathBuf {
    let name = scan
        .file_name()
        .map(OsStr::to_string_lossy)
        .unwrap_or_default();
    let parent = scan.parent().unwrap_or(scan);
    parent.join(format!("{name}_review"))
}

/// Make `path` absolute and resolve symlinks for the part that exists, so that
/// containment checks compare like with like even before the directory is
/// created.
fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut existing = absolute.as_path();
    let mut missing: Vec<&OsStr> = Vec::new();
    loop {
        if let Ok(canonical) = std::fs::canonicalize(existing) {
            let mut resolved = canonical;
            for part in missing.iter().rev() {
                resolved.push(part);
            }
            return lexical_clean(&resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return lexical_clean(&absolute),
        }
    }
}

/// Drop `.` and fold `..` components without touching the filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_rejects_missing_scan_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = BatchRoots::resolve(&dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, PreflightError::ScanRootNotDirectory(_)));
    }

    #[test]
    fn test_resolve_rejects_file_as_scan_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.png");
        fs::write(&file, b"x").unwrap();
        let err = BatchRoots::resolve(&file, None).unwrap_err();
        assert!(matches!(err, PreflightError::ScanRootNotDirectory(_)));
    }

    #[test]
    fn test_resolve_rejects_nested_review_root() {
        let dir = tempfile::tempdir().unwrap();
        let scan = dir.path().join("images");
        fs::create_dir_all(&scan).unwrap();

        let err = BatchRoots::resolve(&scan, Some(&scan.join("Review"))).unwrap_err();
        assert!(matches!(err, PreflightError::OverlappingRoots { .. }));
    }

    #[test]
    fn test_resolve_rejects_review_root_containing_scan() {
        let dir = tempfile::tempdir().unwrap();
        let scan = dir.path().join("images");
        fs::create_dir_all(&scan).unwrap();

        let err = BatchRoots::resolve(&scan, Some(dir.path())).unwrap_err();
        assert!(matches!(err, PreflightError::OverlappingRoots { .. }));
    }

    #[test]
    fn test_resolve_rejects_nested_review_root_via_dotdot() {
        let dir = tempfile::tempdir().unwrap();
        let scan = dir.path().join("images");
        fs::create_dir_all(scan.join("sub")).unwrap();

        let sneaky = scan.join("sub").join("..").join("Review");
        let err = BatchRoots::resolve(&scan, Some(&sneaky)).unwrap_err();
        assert!(matches!(err, PreflightError::OverlappingRoots { .. }));
    }

    #[test]
    fn test_resolve_defaults_to_sibling_review_root() {
        let dir = tempfile::tempdir().unwrap();
        let scan = dir.path().join("images");
        fs::create_dir_all(&scan).unwrap();

        let roots = BatchRoots::resolve(&scan, None).unwrap();
        assert!(roots.review.ends_with("images_review"));
        assert_eq!(roots.review.parent(), roots.scan.parent());
    }

    #[test]
    fn test_similar_prefix_is_not_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let scan = dir.path().join("images");
        fs::create_dir_all(&scan).unwrap();

        let roots = BatchRoots::resolve(&scan, Some(&dir.path().join("images2"))).unwrap();
        assert!(roots.review.ends_with("images2"));
    }

    #[test]
    fn test_ensure_review_root_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let scan = dir.path().join("images");
        fs::create_dir_all(&scan).unwrap();

        let roots = BatchRoots::resolve(&scan, Some(&dir.path().join("out/review"))).unwrap();
        roots.ensure_review_root().unwrap();
        assert!(roots.review.is_dir());
    }

    #[test]
    fn test_lexical_clean() {
        assert_eq!(
            lexical_clean(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
    }

    #[test]
    fn test_find_tool_missing() {
        assert!(find_tool("archivist-test-no-such-tool").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_find_tool_explicit_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("fake-tool");
        fs::write(&tool, "#!/bin/sh\n").unwrap();
        let tool_str = tool.to_string_lossy().into_owned();

        fs::set_permissions(&tool, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(find_tool(&tool_str).is_err());

        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(find_tool(&tool_str).unwrap().ends_with("fake-tool"));
    }

    #[test]
    fn test_check_tools_reports_missing_tool() {
        let tools = ToolsConfig {
            metadata_reader: "archivist-test-no-such-reader".to_string(),
            encoder: "archivist-test-no-such-encoder".to_string(),
        };
        match check_tools(&tools) {
            Err(PreflightError::ToolMissing { tool }) => {
                assert_eq!(tool, "archivist-test-no-such-reader")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
