//! Workspace - central configuration hub.
//!
//! A Workspace is the loaded `Quay.toml`: the workspace name, its projects,
//! the declared third-party dependencies and scheme generation options.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::core::declaration::Dependencies;
use crate::core::manifest::Manifest;
use crate::core::project::Project;
use crate::core::scheme::CoverageMode;
use crate::util::GlobalContext;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Quay.toml";

/// Directory (relative to the workspace root) holding dependency state.
pub const DEPENDENCIES_DIR: &str = "Quay/Dependencies";

/// Errors locating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{}` in `{}` or any parent directory", MANIFEST_NAME, .dir.display())]
    NotFound { dir: PathBuf },
}

/// Find the manifest in `dir`.
pub fn find_manifest(dir: &Path) -> Result<PathBuf, ManifestError> {
    let candidate = dir.join(MANIFEST_NAME);
    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(ManifestError::NotFound {
            dir: dir.to_path_buf(),
        })
    }
}

/// A loaded workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Workspace name
    name: String,

    /// Directory containing Quay.toml
    root: PathBuf,

    /// Projects with absolute paths
    projects: Vec<Project>,

    /// Third-party dependency declarations
    dependencies: Dependencies,

    /// Whether autogenerated schemes gather coverage
    code_coverage: bool,

    coverage_mode: CoverageMode,
}

impl Workspace {
    /// Load a workspace from a manifest path.
    pub fn new(manifest_path: &Path, _ctx: &GlobalContext) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        let root = manifest_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        Self::from_manifest(&manifest, root)
    }

    /// Build a workspace from an already parsed manifest.
    pub fn from_manifest(manifest: &Manifest, root: PathBuf) -> Result<Self> {
        let dependencies = manifest.dependencies(&root)?;
        let projects = manifest.projects(&root);
        let coverage_mode = manifest.coverage_mode(&root);

        Ok(Workspace {
            name: manifest.workspace.name.clone(),
            projects,
            dependencies,
            code_coverage: manifest.workspace.code_coverage,
            coverage_mode,
            root,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_NAME)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    pub fn code_coverage(&self) -> bool {
        self.code_coverage
    }

    pub fn coverage_mode(&self) -> &CoverageMode {
        &self.coverage_mode
    }

    /// The directory holding resolver working state and lockfiles.
    pub fn dependencies_dir(&self) -> PathBuf {
        self.root.join(DEPENDENCIES_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_workspace(dir: &Path) -> PathBuf {
        let manifest_path = dir.join(MANIFEST_NAME);
        std::fs::write(
            &manifest_path,
            r#"
[workspace]
name = "Sample"

[[projects]]
path = "App"

[[projects.targets]]
name = "App"
platform = "ios"
"#,
        )
        .unwrap();
        manifest_path
    }

    #[test]
    fn test_workspace_creation() {
        let tmp = TempDir::new().unwrap();
        let manifest_path = create_test_workspace(tmp.path());
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        let ws = Workspace::new(&manifest_path, &ctx).unwrap();
        assert_eq!(ws.name(), "Sample");
        assert_eq!(ws.projects().len(), 1);
        assert_eq!(ws.projects()[0].path, tmp.path().join("App"));
        assert!(!ws.code_coverage());
        assert_eq!(ws.coverage_mode(), &CoverageMode::All);
    }

    #[test]
    fn test_workspace_paths() {
        let tmp = TempDir::new().unwrap();
        let manifest_path = create_test_workspace(tmp.path());
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());

        let ws = Workspace::new(&manifest_path, &ctx).unwrap();
        assert!(ws.dependencies_dir().ends_with("Quay/Dependencies"));
        assert_eq!(ws.manifest_path(), manifest_path);
    }

    #[test]
    fn test_find_manifest_missing() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            find_manifest(tmp.path()),
            Err(ManifestError::NotFound { .. })
        ));
    }
}
