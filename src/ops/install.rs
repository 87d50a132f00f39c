//! Install third-party dependencies.
//!
//! Installing regenerates the package manager's working directory from the
//! declarations, lets the package manager resolve it, persists the
//! resulting lockfile and builds the dependency graph from the checkouts.

use std::path::Path;

use anyhow::{Context, Result};
use semver::Version;

use crate::core::declaration::Dependencies;
use crate::graph::{DependencyGraph, GraphGenerator};
use crate::ops::lockfile::{is_stale, DependencyPaths, LockfileStore};
use crate::ops::manifest::build_manifest;
use crate::resolver::PackageResolver;
use crate::util::fs::FileSystem;

/// Options for `install`.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Resolve to the newest allowed versions instead of honoring the lockfile
    pub should_update: bool,

    /// Tools version overriding the one declared in `Quay.toml`
    pub tools_version: Option<Version>,
}

/// Result of a successful install.
#[derive(Debug)]
pub struct InstallReport {
    pub graph: DependencyGraph,

    /// Digest of the persisted lockfile, if the install produced one
    pub lockfile_digest: Option<String>,

    /// Whether the lockfile found before resolution was out of date
    pub stale: bool,
}

/// Runs the install pipeline against a filesystem and a package resolver.
pub struct Installer<'a> {
    fs: &'a dyn FileSystem,
    resolver: &'a dyn PackageResolver,
}

impl<'a> Installer<'a> {
    pub fn new(fs: &'a dyn FileSystem, resolver: &'a dyn PackageResolver) -> Self {
        Installer { fs, resolver }
    }

    /// Install `dependencies` into `dependencies_dir`.
    ///
    /// Running it twice with the same declarations and lockfile leaves the
    /// lockfile byte-identical and produces the same graph.
    pub fn install(
        &self,
        dependencies_dir: &Path,
        dependencies: &Dependencies,
        options: &InstallOptions,
    ) -> Result<InstallReport> {
        let paths = DependencyPaths::new(dependencies_dir);
        let store = LockfileStore::new(self.fs);

        let stale = match store.load(&paths.lockfile)? {
            Some(previous) if is_stale(&previous, dependencies) => {
                tracing::info!(
                    "lockfile {} does not match the declared packages; it will be updated",
                    paths.lockfile.display()
                );
                true
            }
            _ => false,
        };

        store.stage(&paths)?;
        self.fs.create_dir_all(&paths.working_dir)?;

        let tools_version = options
            .tools_version
            .as_ref()
            .or(dependencies.tools_version.as_ref());
        let manifest = build_manifest(dependencies, tools_version)?;
        self.fs
            .write(&paths.manifest, manifest.as_bytes())
            .context("failed to write Package.swift")?;
        self.resolver
            .set_tools_version(&paths.working_dir, tools_version)?;
        tracing::debug!("Package.swift:\n{}", manifest);

        if options.should_update {
            tracing::info!("Updating dependencies");
            self.resolver.update(&paths.working_dir)?;
        } else {
            tracing::info!("Resolving dependencies");
            self.resolver.resolve(&paths.working_dir)?;
        }

        store.commit(&paths, dependencies.has_remote_packages())?;

        let lockfile = store.load(&paths.lockfile)?;
        let graph = GraphGenerator::new(self.fs, self.resolver).generate(
            &paths.build_dir,
            dependencies,
            lockfile.as_ref(),
        )?;

        tracing::info!(
            "Installed {} package(s) providing {} product(s)",
            graph.packages().count(),
            graph.len()
        );

        Ok(InstallReport {
            graph,
            lockfile_digest: lockfile.map(|l| l.digest()),
            stale,
        })
    }
}

/// Remove the package manager's working directory and the persisted lockfile.
pub fn clean(fs: &dyn FileSystem, dependencies_dir: &Path) -> Result<()> {
    let paths = DependencyPaths::new(dependencies_dir);
    fs.remove(&paths.working_dir)
        .with_context(|| format!("failed to remove {}", paths.working_dir.display()))?;
    fs.remove(&paths.lockfile)
        .with_context(|| format!("failed to remove {}", paths.lockfile.display()))?;
    Ok(())
}
