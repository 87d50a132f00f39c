//! Projects - a named group of targets at one path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::product::ProductType;
use crate::core::target::Target;

/// An in-repo project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Absolute project directory
    pub path: PathBuf,

    /// Project name
    pub name: String,

    /// Targets, in declaration order
    pub targets: Vec<Target>,

    /// Product types this project requires of external products
    pub product_type_overrides: BTreeMap<String, ProductType>,
}

impl Project {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Project {
            path: path.into(),
            name: name.into(),
            targets: Vec::new(),
            product_type_overrides: BTreeMap::new(),
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_product_type(mut self, product: impl Into<String>, ty: ProductType) -> Self {
        self.product_type_overrides.insert(product.into(), ty);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }
}
