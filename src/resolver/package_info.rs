//! Models of the package manager's output.
//!
//! `workspace-state.json` lists every resolved package and where it was
//! checked out. `swift package dump-package` describes a single package:
//! its platforms, products and targets.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::platform::{OsVersion, Platform};

/// Contents of `.build/workspace-state.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceState {
    pub object: WorkspaceStateObject,

    #[serde(default)]
    pub version: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceStateObject {
    #[serde(default)]
    pub dependencies: Vec<ManagedDependency>,
}

/// A resolved package recorded by the package manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDependency {
    pub package_ref: PackageRef,

    /// Checkout directory name under `.build/checkouts`
    pub subpath: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ManagedState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRef {
    pub identity: String,
    pub kind: String,
    pub location: String,
    pub name: String,
}

impl PackageRef {
    /// File system packages are used in place. Local git repositories are
    /// cloned into `checkouts/` like remote ones.
    pub fn is_local(&self) -> bool {
        matches!(self.kind.as_str(), "fileSystem" | "local")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_state: Option<CheckoutState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl ManagedDependency {
    /// Where the package sources live on disk.
    pub fn checkout_path(&self, build_dir: &Path) -> PathBuf {
        if self.package_ref.is_local() {
            PathBuf::from(&self.package_ref.location)
        } else {
            build_dir.join("checkouts").join(&self.subpath)
        }
    }

    pub fn checkout_state(&self) -> Option<&CheckoutState> {
        self.state.as_ref().and_then(|s| s.checkout_state.as_ref())
    }
}

/// Output of `swift package dump-package`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,

    #[serde(default)]
    pub platforms: Vec<PlatformRequirement>,

    #[serde(default)]
    pub products: Vec<ProductInfo>,

    #[serde(default)]
    pub targets: Vec<TargetInfo>,
}

impl PackageInfo {
    pub fn target(&self, name: &str) -> Option<&TargetInfo> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn product(&self, name: &str) -> Option<&ProductInfo> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Declared minimum versions for the platforms quay knows.
    ///
    /// Unknown platform names (linux, driverkit, ...) are ignored.
    pub fn minimum_versions(&self) -> Vec<(Platform, Option<OsVersion>)> {
        self.platforms
            .iter()
            .filter_map(|p| {
                let platform = Platform::from_package_name(&p.platform_name)?;
                Some((platform, p.version.parse().ok()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRequirement {
    pub platform_name: String,
    pub version: String,
}

/// A product declared by a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,

    #[serde(default)]
    pub targets: Vec<String>,

    /// Raw product type, e.g. `{"library": ["automatic"]}`
    #[serde(rename = "type")]
    pub kind: Value,
}

/// Library linkage requested by a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    Automatic,
    Static,
    Dynamic,
}

/// Product kinds as described by the package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductKind {
    Library(LibraryKind),
    Executable,
    Plugin,
    Other(String),
}

impl ProductInfo {
    pub fn product_kind(&self) -> ProductKind {
        let Some((key, value)) = self.kind.as_object().and_then(|o| o.iter().next()) else {
            return ProductKind::Other(self.kind.to_string());
        };

        match key.as_str() {
            "library" => {
                let linkage = value
                    .as_array()
                    .and_then(|a| a.first())
                    .and_then(Value::as_str)
                    .unwrap_or("automatic");
                ProductKind::Library(match linkage {
                    "static" => LibraryKind::Static,
                    "dynamic" => LibraryKind::Dynamic,
                    _ => LibraryKind::Automatic,
                })
            }
            "executable" => ProductKind::Executable,
            "plugin" => ProductKind::Plugin,
            other => ProductKind::Other(other.to_string()),
        }
    }
}

/// A target declared by a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetInfo {
    pub name: String,

    #[serde(rename = "type", default = "regular")]
    pub kind: String,

    #[serde(default)]
    pub dependencies: Vec<TargetDependencyInfo>,
}

fn regular() -> String {
    "regular".to_string()
}

/// A target dependency, e.g. `{"product": ["Logging", "swift-log", null, null]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetDependencyInfo {
    ByName(Vec<Value>),
    Product(Vec<Value>),
    Target(Vec<Value>),
}

impl TargetDependencyInfo {
    pub fn name(&self) -> &str {
        let parts = match self {
            TargetDependencyInfo::ByName(p)
            | TargetDependencyInfo::Product(p)
            | TargetDependencyInfo::Target(p) => p,
        };
        parts.first().and_then(Value::as_str).unwrap_or_default()
    }
}
