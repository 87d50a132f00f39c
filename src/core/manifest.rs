//! Quay.toml manifest parsing and schema.
//!
//! The manifest declares the workspace, its projects and targets, and the
//! third-party packages they depend on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::declaration::{Dependencies, DependenciesSpec};
use crate::core::product::ProductType;
use crate::core::project::Project;
use crate::core::scheme::CoverageMode;
use crate::core::target::{Target, TargetDependency, TargetReference};
use crate::util::fs::lexical_normalize;

/// Workspace section: `[workspace]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkspaceSpec {
    /// Workspace name, used as the prefix of autogenerated schemes
    pub name: String,

    /// Gather code coverage in autogenerated schemes
    #[serde(default)]
    pub code_coverage: bool,

    /// Which targets contribute to coverage
    #[serde(default)]
    pub coverage_mode: CoverageMode,
}

/// A `[[projects]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectSpec {
    /// Project directory, relative to the manifest
    pub path: PathBuf,

    /// Project name (defaults to the directory name)
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub targets: Vec<Target>,

    /// Product type overrides for external products
    #[serde(default)]
    pub product_types: BTreeMap<String, ProductType>,
}

/// The parsed `Quay.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub workspace: WorkspaceSpec,

    #[serde(default)]
    pub dependencies: DependenciesSpec,

    #[serde(default)]
    pub projects: Vec<ProjectSpec>,
}

impl Manifest {
    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse a manifest from a string.
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        Ok(manifest)
    }

    /// Validated dependency declarations, with local paths made absolute.
    pub fn dependencies(&self, manifest_dir: &Path) -> Result<Dependencies> {
        let deps = self.dependencies.to_dependencies(manifest_dir)?;
        Ok(deps)
    }

    /// Projects with absolute paths.
    ///
    /// Cross-project dependency paths are relative to the declaring project.
    pub fn projects(&self, manifest_dir: &Path) -> Vec<Project> {
        self.projects
            .iter()
            .map(|spec| {
                let path = lexical_normalize(&manifest_dir.join(&spec.path));
                let name = spec.name.clone().unwrap_or_else(|| {
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                });

                let targets = spec
                    .targets
                    .iter()
                    .map(|target| {
                        let mut target = target.clone();
                        for dep in &mut target.dependencies {
                            if let TargetDependency::Project { project, .. } = dep {
                                *project = lexical_normalize(&path.join(&*project));
                            }
                        }
                        target
                    })
                    .collect();

                Project {
                    path,
                    name,
                    targets,
                    product_type_overrides: spec.product_types.clone(),
                }
            })
            .collect()
    }

    /// The coverage mode with selected target paths made absolute.
    pub fn coverage_mode(&self, manifest_dir: &Path) -> CoverageMode {
        match &self.workspace.coverage_mode {
            CoverageMode::Selected(refs) => CoverageMode::Selected(
                refs.iter()
                    .map(|r| {
                        TargetReference::new(
                            lexical_normalize(&manifest_dir.join(&r.project_path)),
                            r.name.clone(),
                        )
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}
