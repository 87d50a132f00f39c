//! Target definitions - the in-repo build units.
//!
//! A Target belongs to exactly one project. Across a workspace, a target is
//! identified by its TargetReference: the owning project's path plus the
//! target name.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::platform::Platform;
use crate::core::product::ProductType;

/// Identifies a build unit across the projects of a workspace.
///
/// Ordering is by project path, then by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetReference {
    pub project_path: PathBuf,
    pub name: String,
}

impl TargetReference {
    pub fn new(project_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        TargetReference {
            project_path: project_path.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TargetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_path.display(), self.name)
    }
}

/// A dependency declared by an in-repo target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetDependency {
    /// A target in another project: `{ project = "../Kit", target = "Kit" }`
    Project { project: PathBuf, target: String },

    /// A target in the same project: `{ target = "Core" }`
    Target { target: String },

    /// A product of an external package: `{ external = "Alamofire" }`
    External { external: String },
}

impl TargetDependency {
    pub fn target(name: impl Into<String>) -> Self {
        TargetDependency::Target {
            target: name.into(),
        }
    }

    pub fn project(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        TargetDependency::Project {
            project: path.into(),
            target: name.into(),
        }
    }

    pub fn external(product: impl Into<String>) -> Self {
        TargetDependency::External {
            external: product.into(),
        }
    }
}

/// An in-repo build target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Target name, unique within its project
    pub name: String,

    /// Platform the target is built for
    pub platform: Platform,

    /// What the target produces
    #[serde(default)]
    pub product: ProductType,

    /// Declared dependencies
    #[serde(default)]
    pub dependencies: Vec<TargetDependency>,
}

impl Target {
    pub fn new(name: impl Into<String>, platform: Platform, product: ProductType) -> Self {
        Target {
            name: name.into(),
            platform,
            product,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, dependency: TargetDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// The reference to this target when it lives in the project at `project_path`.
    pub fn reference(&self, project_path: &Path) -> TargetReference {
        TargetReference::new(project_path, &self.name)
    }
}
