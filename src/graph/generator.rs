//! Build the third-party dependency graph from the package manager's output.
//!
//! After resolution, `.build/workspace-state.json` lists every package the
//! package manager checked out. Each package is described with
//! `dump-package`; its products become graph nodes and the products its
//! targets reference become edges.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use crate::core::declaration::Dependencies;
use crate::core::platform::{OsVersion, Platform};
use crate::core::product::ProductType;
use crate::graph::{DependencyGraph, ExternalProduct, GraphError, ResolvedPackage};
use crate::resolver::encode::Lockfile;
use crate::resolver::package_info::{
    LibraryKind, ManagedDependency, PackageInfo, ProductInfo, ProductKind, TargetDependencyInfo,
    WorkspaceState,
};
use crate::resolver::PackageResolver;
use crate::util::fs::FileSystem;

/// File written by the package manager inside `.build`.
pub const WORKSPACE_STATE_FILE: &str = "workspace-state.json";

/// The product type a package product maps to when no override applies.
///
/// Plugins and other non-linkable products are not part of the graph.
pub fn default_product_type(kind: &ProductKind) -> Option<ProductType> {
    match kind {
        ProductKind::Library(LibraryKind::Automatic) => Some(ProductType::StaticFramework),
        ProductKind::Library(LibraryKind::Static) => Some(ProductType::StaticLibrary),
        ProductKind::Library(LibraryKind::Dynamic) => Some(ProductType::Framework),
        ProductKind::Executable => Some(ProductType::Executable),
        ProductKind::Plugin | ProductKind::Other(_) => None,
    }
}

/// Generates a [`DependencyGraph`] from a resolved working directory.
pub struct GraphGenerator<'a> {
    fs: &'a dyn FileSystem,
    resolver: &'a dyn PackageResolver,
}

/// A package that survived platform filtering, with its description.
struct IncludedPackage {
    identity: String,
    info: PackageInfo,
}

impl<'a> GraphGenerator<'a> {
    pub fn new(fs: &'a dyn FileSystem, resolver: &'a dyn PackageResolver) -> Self {
        GraphGenerator { fs, resolver }
    }

    /// Build the graph for the packages resolved into `build_dir`.
    ///
    /// `dependencies` supplies the requested platforms, deployment targets,
    /// product type overrides and tools version. `lockfile`, when present,
    /// provides the resolved reference of each package.
    pub fn generate(
        &self,
        build_dir: &Path,
        dependencies: &Dependencies,
        lockfile: Option<&Lockfile>,
    ) -> Result<DependencyGraph, GraphError> {
        let mut managed = self.read_workspace_state(build_dir)?;
        managed.sort_by(|a, b| a.package_ref.identity.cmp(&b.package_ref.identity));

        let requested: BTreeSet<Platform> = if dependencies.platforms.is_empty() {
            Platform::ALL.into_iter().collect()
        } else {
            dependencies.platforms.clone()
        };

        let mut graph = DependencyGraph::new(dependencies.tools_version.clone());
        let mut included = Vec::new();
        // Product name -> identity of the package that was dropped
        let mut excluded_products: HashMap<String, String> = HashMap::new();

        for dependency in &managed {
            let identity = dependency.package_ref.identity.clone();
            let path = dependency.checkout_path(build_dir);
            let info = self.resolver.load_package_info(&path)?;

            let platforms = supported_platforms(&info, &requested);
            if platforms.is_empty() {
                tracing::warn!(
                    "package `{}` supports none of the requested platforms ({}); skipping it",
                    identity,
                    join(&requested)
                );
                for product in &info.products {
                    excluded_products.insert(product.name.clone(), identity.clone());
                }
                continue;
            }

            let deployment_targets =
                deployment_targets(&info, &platforms, &dependencies.deployment_targets);

            let mut product_names = Vec::new();
            for product in &info.products {
                let Some(product_type) = product_type(product, &dependencies.product_types) else {
                    tracing::debug!(
                        "skipping product `{}` of `{}`: not a linkable product",
                        product.name,
                        identity
                    );
                    continue;
                };

                graph.add_product(ExternalProduct {
                    name: product.name.clone(),
                    package: identity.clone(),
                    product_type,
                    platforms: platforms.clone(),
                    deployment_targets: deployment_targets.clone(),
                })?;
                product_names.push(product.name.clone());
            }

            graph.add_package(ResolvedPackage {
                identity: identity.clone(),
                name: info.name.clone(),
                reference: resolved_reference(dependency, lockfile),
                path,
                products: product_names,
                platforms,
                deployment_targets,
            });

            included.push(IncludedPackage { identity, info });
        }

        for package in &included {
            for product in &package.info.products {
                if !graph.contains(&product.name) {
                    continue;
                }
                for required in product_dependencies(package, product)? {
                    if graph.contains(&required) {
                        graph.add_edge(&product.name, &required);
                        continue;
                    }
                    if let Some(dropped) = excluded_products.get(&required) {
                        tracing::warn!(
                            "`{}` requires `{}` from `{}`, which was excluded for lack of platform support",
                            package.identity,
                            required,
                            dropped
                        );
                    }
                    return Err(GraphError::UnresolvedProductReference {
                        package: package.identity.clone(),
                        product: required,
                    });
                }
            }
        }

        graph.check_acyclic()?;

        tracing::debug!(
            "dependency graph: {} packages, {} products",
            included.len(),
            graph.len()
        );

        Ok(graph)
    }

    fn read_workspace_state(&self, build_dir: &Path) -> Result<Vec<ManagedDependency>, GraphError> {
        let path = build_dir.join(WORKSPACE_STATE_FILE);
        let invalid = |message: String| GraphError::InvalidWorkspaceState {
            path: path.clone(),
            message,
        };

        if !self.fs.exists(&path) {
            return Err(invalid("file not found".to_string()));
        }

        let contents = self
            .fs
            .read_to_string(&path)
            .map_err(|e| invalid(format!("{:#}", e)))?;
        let state: WorkspaceState =
            serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?;

        Ok(state.object.dependencies)
    }
}

/// Platforms the package supports among those requested.
///
/// A package that declares no platform minimums supports all of them.
fn supported_platforms(info: &PackageInfo, requested: &BTreeSet<Platform>) -> BTreeSet<Platform> {
    let declared: BTreeSet<Platform> = info
        .minimum_versions()
        .into_iter()
        .map(|(platform, _)| platform)
        .collect();

    if declared.is_empty() {
        requested.clone()
    } else {
        declared.intersection(requested).copied().collect()
    }
}

/// Effective deployment target per supported platform.
///
/// The package minimum and the requested minimum are combined with `max`;
/// when neither is known the platform default applies.
fn deployment_targets(
    info: &PackageInfo,
    platforms: &BTreeSet<Platform>,
    requested: &BTreeMap<Platform, OsVersion>,
) -> BTreeMap<Platform, OsVersion> {
    let declared: BTreeMap<Platform, OsVersion> = info
        .minimum_versions()
        .into_iter()
        .filter_map(|(platform, version)| Some((platform, version?)))
        .collect();

    platforms
        .iter()
        .map(|&platform| {
            let effective = match (declared.get(&platform), requested.get(&platform)) {
                (Some(package), Some(wanted)) => OsVersion::max_of(package, wanted),
                (Some(package), None) => package.clone(),
                (None, Some(wanted)) => wanted.clone(),
                (None, None) => platform.default_deployment_target(),
            };
            (platform, effective)
        })
        .collect()
}

fn product_type(
    product: &ProductInfo,
    overrides: &BTreeMap<String, ProductType>,
) -> Option<ProductType> {
    let default = default_product_type(&product.product_kind())?;
    Some(overrides.get(&product.name).copied().unwrap_or(default))
}

fn resolved_reference(dependency: &ManagedDependency, lockfile: Option<&Lockfile>) -> Option<String> {
    if let Some(pin) = lockfile.and_then(|l| l.pin(&dependency.package_ref.identity)) {
        return Some(pin.state.reference().to_string());
    }

    let checkout = dependency.checkout_state()?;
    checkout
        .version
        .clone()
        .or_else(|| checkout.branch.clone())
        .or_else(|| checkout.revision.clone())
}

/// Names of the products a product requires, found by walking its targets
/// and their same-package target dependencies.
fn product_dependencies(
    package: &IncludedPackage,
    product: &ProductInfo,
) -> Result<BTreeSet<String>, GraphError> {
    let info = &package.info;
    let mut required = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut stack: Vec<&str> = product.targets.iter().map(String::as_str).collect();

    while let Some(name) = stack.pop() {
        if !visited.insert(name) {
            continue;
        }

        let target = info.target(name).ok_or_else(|| GraphError::InvalidPackageInfo {
            package: package.identity.clone(),
            message: format!("product `{}` references unknown target `{}`", product.name, name),
        })?;

        for dependency in &target.dependencies {
            let dep_name = dependency.name();
            match dependency {
                TargetDependencyInfo::Target(_) => stack.push(dep_name),
                TargetDependencyInfo::ByName(_) if info.target(dep_name).is_some() => {
                    stack.push(dep_name)
                }
                TargetDependencyInfo::ByName(_) | TargetDependencyInfo::Product(_) => {
                    required.insert(dep_name.to_string());
                }
            }
        }
    }

    Ok(required)
}

fn join(platforms: &BTreeSet<Platform>) -> String {
    platforms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
