//! Test fixtures for common test scenarios.
//!
//! Builders for the files the package manager produces and for small
//! workspaces.

use std::path::Path;

use serde_json::{json, Value};

use crate::core::platform::Platform;
use crate::core::product::ProductType;
use crate::core::project::Project;
use crate::core::target::{Target, TargetDependency};
use crate::resolver::encode::{Lockfile, Pin, PinState};
use crate::resolver::package_info::{
    CheckoutState, ManagedDependency, ManagedState, PackageInfo, PackageRef, PlatformRequirement,
    ProductInfo, TargetDependencyInfo, TargetInfo, WorkspaceState, WorkspaceStateObject,
};

/// A remote package checked out under `.build/checkouts/<name>`.
pub fn remote_dependency(identity: &str, name: &str, version: &str) -> ManagedDependency {
    ManagedDependency {
        package_ref: PackageRef {
            identity: identity.to_string(),
            kind: "remoteSourceControl".to_string(),
            location: format!("https://github.com/example/{}", name),
            name: name.to_string(),
        },
        subpath: name.to_string(),
        state: Some(ManagedState {
            checkout_state: Some(CheckoutState {
                revision: Some(format!("{:0<40}", identity.len())),
                version: Some(version.to_string()),
                branch: None,
            }),
        }),
    }
}

/// A package used in place from the local filesystem.
pub fn local_dependency(identity: &str, name: &str, path: &Path) -> ManagedDependency {
    ManagedDependency {
        package_ref: PackageRef {
            identity: identity.to_string(),
            kind: "fileSystem".to_string(),
            location: path.display().to_string(),
            name: name.to_string(),
        },
        subpath: name.to_string(),
        state: None,
    }
}

/// `workspace-state.json` text listing `dependencies`.
pub fn workspace_state_json(dependencies: Vec<ManagedDependency>) -> String {
    let state = WorkspaceState {
        object: WorkspaceStateObject { dependencies },
        version: 5,
    };
    serde_json::to_string_pretty(&state).unwrap_or_default()
}

/// `Package.resolved` text pinning `(identity, url, version)` triples.
pub fn lockfile_json(pins: &[(&str, &str, &str)]) -> String {
    let pins = pins
        .iter()
        .map(|(identity, url, version)| {
            Pin::new(
                *identity,
                *url,
                PinState {
                    branch: None,
                    revision: format!("{:0<40}", version.replace('.', "")),
                    version: Some(version.to_string()),
                },
            )
        })
        .collect();

    Lockfile::from_pins(pins)
        .map(|l| l.contents().to_string())
        .unwrap_or_default()
}

/// `byName` target dependency.
pub fn by_name(name: &str) -> TargetDependencyInfo {
    TargetDependencyInfo::ByName(vec![json!(name), Value::Null])
}

/// `product` target dependency.
pub fn product_dependency(name: &str, package: &str) -> TargetDependencyInfo {
    TargetDependencyInfo::Product(vec![json!(name), json!(package), Value::Null, Value::Null])
}

/// `target` target dependency.
pub fn target_dependency(name: &str) -> TargetDependencyInfo {
    TargetDependencyInfo::Target(vec![json!(name), Value::Null])
}

/// Builder for `dump-package` output.
#[derive(Debug, Clone)]
pub struct PackageInfoBuilder {
    info: PackageInfo,
}

impl PackageInfoBuilder {
    pub fn new(name: &str) -> Self {
        PackageInfoBuilder {
            info: PackageInfo {
                name: name.to_string(),
                platforms: Vec::new(),
                products: Vec::new(),
                targets: Vec::new(),
            },
        }
    }

    /// Declare a minimum platform version, e.g. `("ios", "13.0")`.
    pub fn platform(mut self, name: &str, version: &str) -> Self {
        self.info.platforms.push(PlatformRequirement {
            platform_name: name.to_string(),
            version: version.to_string(),
        });
        self
    }

    /// Add a library product; `linkage` is `automatic`, `static` or `dynamic`.
    pub fn library(self, name: &str, linkage: &str, targets: &[&str]) -> Self {
        self.product(name, json!({ "library": [linkage] }), targets)
    }

    pub fn executable(self, name: &str, targets: &[&str]) -> Self {
        self.product(name, json!({ "executable": null }), targets)
    }

    pub fn plugin(self, name: &str, targets: &[&str]) -> Self {
        self.product(name, json!({ "plugin": null }), targets)
    }

    fn product(mut self, name: &str, kind: Value, targets: &[&str]) -> Self {
        self.info.products.push(ProductInfo {
            name: name.to_string(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
            kind,
        });
        self
    }

    /// Add a regular target with dependencies.
    pub fn target(mut self, name: &str, dependencies: Vec<TargetDependencyInfo>) -> Self {
        self.info.targets.push(TargetInfo {
            name: name.to_string(),
            kind: "regular".to_string(),
            dependencies,
        });
        self
    }

    pub fn build(self) -> PackageInfo {
        self.info
    }
}

/// A project with one target per `(name, platform, product)`.
pub fn project(path: &str, targets: &[(&str, Platform, ProductType)]) -> Project {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    targets
        .iter()
        .fold(Project::new(path, name), |project, (target, platform, product)| {
            project.with_target(Target::new(*target, *platform, *product))
        })
}

/// An app target depending on external products.
pub fn app_target(name: &str, platform: Platform, externals: &[&str]) -> Target {
    externals
        .iter()
        .fold(Target::new(name, platform, ProductType::App), |target, product| {
            target.with_dependency(TargetDependency::external(*product))
        })
}

/// A minimal `Quay.toml` with one iOS app depending on `externals`.
pub fn quay_toml(name: &str, externals: &[&str]) -> String {
    let deps = externals
        .iter()
        .map(|e| format!("{{ external = \"{}\" }}", e))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"[workspace]
name = "{name}"

[dependencies]
platforms = ["ios"]

[[projects]]
path = "App"

[[projects.targets]]
name = "App"
platform = "ios"
product = "app"
dependencies = [{deps}]
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_state_fixture_parses() {
        let text = workspace_state_json(vec![remote_dependency("alamofire", "Alamofire", "5.4.3")]);
        let state: WorkspaceState = serde_json::from_str(&text).unwrap();
        assert_eq!(state.object.dependencies[0].package_ref.identity, "alamofire");
    }

    #[test]
    fn test_lockfile_fixture_parses() {
        let text = lockfile_json(&[("alamofire", "https://github.com/Alamofire/Alamofire", "5.4.3")]);
        let lockfile = Lockfile::parse(&text).unwrap();
        assert_eq!(
            lockfile.pin("alamofire").unwrap().state.version.as_deref(),
            Some("5.4.3")
        );
    }

    #[test]
    fn test_project_fixture() {
        let project = project("/work/App", &[("App", Platform::Ios, ProductType::App)]);
        assert_eq!(project.name, "App");
        assert!(project.target("App").is_some());
    }
}
