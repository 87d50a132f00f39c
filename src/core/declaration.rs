//! Package declarations.
//!
//! A PackageDeclaration describes a third-party package the workspace
//! requires: where it comes from (remote URL or local path) and which
//! versions are acceptable. Declarations are immutable once loaded.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::core::platform::{OsVersion, Platform};
use crate::core::product::ProductType;

/// Errors raised while reading dependency declarations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("package `{identity}` is declared more than once with different requirements")]
    DuplicatePackageDeclaration { identity: String },

    #[error("invalid version requirement `{value}` for package `{package}`")]
    InvalidRequirement { package: String, value: String },

    #[error("invalid deployment target `{value}`")]
    InvalidDeploymentTarget { value: String },

    #[error("unknown platform `{platform}`")]
    UnknownPlatform { platform: String },

    #[error("package declaration must specify exactly one of `url` or `path`")]
    MissingSource,

    #[error("invalid package url `{url}`")]
    InvalidUrl { url: String },

    #[error("remote package `{package}` must specify exactly one requirement")]
    AmbiguousRequirement { package: String },
}

/// Where a package comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageSource {
    /// A remote repository, resolved through the lockfile.
    Remote { url: Url },

    /// A package on the local filesystem. Never pinned in the lockfile.
    Local { path: PathBuf },
}

/// A version requirement on a remote package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requirement {
    Exact(Version),
    Range { from: Version, to: Version },
    UpToNextMajor(Version),
    UpToNextMinor(Version),
    Branch(String),
    Revision(String),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Exact(v) => write!(f, "={}", v),
            Requirement::Range { from, to } => write!(f, ">={}, <{}", from, to),
            Requirement::UpToNextMajor(v) => write!(f, "^{}", v),
            Requirement::UpToNextMinor(v) => write!(f, "~{}", v),
            Requirement::Branch(b) => write!(f, "branch {}", b),
            Requirement::Revision(r) => write!(f, "revision {}", r),
        }
    }
}

/// A single third-party package requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageDeclaration {
    source: PackageSource,
    requirement: Option<Requirement>,
}

impl PackageDeclaration {
    /// Declare a remote package.
    pub fn remote(url: Url, requirement: Requirement) -> Self {
        PackageDeclaration {
            source: PackageSource::Remote { url },
            requirement: Some(requirement),
        }
    }

    /// Declare a local package.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        PackageDeclaration {
            source: PackageSource::Local { path: path.into() },
            requirement: None,
        }
    }

    /// The identity the package manager uses for this package.
    ///
    /// Remote: last URL path segment, lowercased, `.git` suffix stripped.
    /// Local: the directory name, lowercased.
    pub fn identity(&self) -> String {
        match &self.source {
            PackageSource::Remote { url } => identity_from_url(url),
            PackageSource::Local { path } => identity_from_path(path),
        }
    }

    pub fn source(&self) -> &PackageSource {
        &self.source
    }

    pub fn requirement(&self) -> Option<&Requirement> {
        self.requirement.as_ref()
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.source, PackageSource::Remote { .. })
    }
}

/// Compute a package identity from its repository URL.
pub fn identity_from_url(url: &Url) -> String {
    let last = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_else(|| url.host_str().unwrap_or_default());
    last.trim_end_matches(".git").to_lowercase()
}

/// Compute a package identity from a repository location string.
///
/// Falls back to the last path component when the location is not a URL
/// (scp-style git remotes such as `git@github.com:org/repo.git`).
pub fn identity_from_location(location: &str) -> String {
    match Url::parse(location) {
        Ok(url) if url.scheme() != "file" => identity_from_url(&url),
        _ => location
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()
            .unwrap_or(location)
            .trim_end_matches(".git")
            .to_lowercase(),
    }
}

fn identity_from_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Parse a version that may omit its minor or patch component (`5`, `5.4`).
pub fn parse_requirement_version(package: &str, value: &str) -> Result<Version, DeclarationError> {
    let invalid = || DeclarationError::InvalidRequirement {
        package: package.to_string(),
        value: value.to_string(),
    };

    if let Ok(v) = Version::parse(value) {
        return Ok(v);
    }

    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() > 3 {
        return Err(invalid());
    }
    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| invalid())?;
    }
    Ok(Version::new(numbers[0], numbers[1], numbers[2]))
}

/// The full dependency specification of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    /// Declared packages
    pub packages: Vec<PackageDeclaration>,

    /// Product type overrides keyed by product name
    pub product_types: BTreeMap<String, ProductType>,

    /// Requested minimum deployment targets
    pub deployment_targets: BTreeMap<Platform, OsVersion>,

    /// Platforms the workspace builds for
    pub platforms: BTreeSet<Platform>,

    /// Tools version to resolve with (`None` = the resolver's default)
    pub tools_version: Option<Version>,
}

impl Dependencies {
    /// Check if any declared package is remote.
    pub fn has_remote_packages(&self) -> bool {
        self.packages.iter().any(PackageDeclaration::is_remote)
    }

    /// Declarations sorted by identity, with exact duplicates removed.
    ///
    /// Fails if one identity is declared twice with different sources or
    /// requirements.
    pub fn sorted_packages(&self) -> Result<Vec<&PackageDeclaration>, DeclarationError> {
        let mut by_identity: BTreeMap<String, &PackageDeclaration> = BTreeMap::new();
        for package in &self.packages {
            let identity = package.identity();
            match by_identity.get(&identity) {
                Some(existing) if *existing != package => {
                    return Err(DeclarationError::DuplicatePackageDeclaration { identity });
                }
                Some(_) => {}
                None => {
                    by_identity.insert(identity, package);
                }
            }
        }
        Ok(by_identity.into_values().collect())
    }

    /// Identities of all declared remote packages.
    pub fn remote_identities(&self) -> BTreeSet<String> {
        self.packages
            .iter()
            .filter(|p| p.is_remote())
            .map(PackageDeclaration::identity)
            .collect()
    }
}

/// Dependencies as they appear in `Quay.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependenciesSpec {
    #[serde(default)]
    pub platforms: Vec<Platform>,

    #[serde(default)]
    pub tools_version: Option<String>,

    #[serde(default)]
    pub packages: Vec<PackageSpec>,

    #[serde(default)]
    pub product_types: BTreeMap<String, ProductType>,

    #[serde(default)]
    pub deployment_targets: BTreeMap<Platform, OsVersion>,
}

/// A package entry in `Quay.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageSpec {
    /// Remote repository URL
    #[serde(default)]
    pub url: Option<String>,

    /// Local path, relative to the manifest directory
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Up to next major from this version
    #[serde(default)]
    pub from: Option<String>,

    #[serde(default)]
    pub exact: Option<String>,

    #[serde(default)]
    pub up_to_next_minor: Option<String>,

    #[serde(default)]
    pub range: Option<RangeSpec>,

    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default)]
    pub revision: Option<String>,
}

/// A half-open version range `from..<to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeSpec {
    pub from: String,
    pub to: String,
}

impl PackageSpec {
    /// Convert to a declaration, resolving local paths against `manifest_dir`.
    pub fn to_declaration(&self, manifest_dir: &Path) -> Result<PackageDeclaration, DeclarationError> {
        match (&self.url, &self.path) {
            (Some(url), None) => {
                let parsed = Url::parse(url)
                    .map_err(|_| DeclarationError::InvalidUrl { url: url.clone() })?;
                let requirement = self.requirement(url)?;
                Ok(PackageDeclaration::remote(parsed, requirement))
            }
            (None, Some(path)) => {
                let full_path = if path.is_absolute() {
                    path.clone()
                } else {
                    manifest_dir.join(path)
                };
                Ok(PackageDeclaration::local(full_path))
            }
            _ => Err(DeclarationError::MissingSource),
        }
    }

    fn requirement(&self, package: &str) -> Result<Requirement, DeclarationError> {
        let version = |v: &str| parse_requirement_version(package, v);

        let mut candidates = Vec::new();
        if let Some(v) = &self.from {
            candidates.push(Requirement::UpToNextMajor(version(v)?));
        }
        if let Some(v) = &self.exact {
            candidates.push(Requirement::Exact(version(v)?));
        }
        if let Some(v) = &self.up_to_next_minor {
            candidates.push(Requirement::UpToNextMinor(version(v)?));
        }
        if let Some(range) = &self.range {
            let from = version(&range.from)?;
            let to = version(&range.to)?;
            if from >= to {
                return Err(DeclarationError::InvalidRequirement {
                    package: package.to_string(),
                    value: format!("{}..<{}", range.from, range.to),
                });
            }
            candidates.push(Requirement::Range { from, to });
        }
        if let Some(b) = &self.branch {
            candidates.push(Requirement::Branch(b.clone()));
        }
        if let Some(r) = &self.revision {
            candidates.push(Requirement::Revision(r.clone()));
        }

        if candidates.len() != 1 {
            return Err(DeclarationError::AmbiguousRequirement {
                package: package.to_string(),
            });
        }
        Ok(candidates.remove(0))
    }
}

impl DependenciesSpec {
    /// Convert to validated Dependencies.
    pub fn to_dependencies(&self, manifest_dir: &Path) -> Result<Dependencies, DeclarationError> {
        let packages = self
            .packages
            .iter()
            .map(|p| p.to_declaration(manifest_dir))
            .collect::<Result<Vec<_>, _>>()?;

        let tools_version = self
            .tools_version
            .as_deref()
            .map(|v| parse_requirement_version("swift-tools-version", v))
            .transpose()?;

        let dependencies = Dependencies {
            packages,
            product_types: self.product_types.clone(),
            deployment_targets: self.deployment_targets.clone(),
            platforms: self.platforms.iter().copied().collect(),
            tools_version,
        };

        // Surface duplicate declarations at load time rather than at install.
        dependencies.sorted_packages()?;

        Ok(dependencies)
    }
}
