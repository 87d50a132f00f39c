//! The external package resolver.
//!
//! quay does not resolve versions itself. It writes a `Package.swift`, hands
//! the working directory to the package manager and reads back what the
//! package manager produced. This module is that boundary.

pub mod encode;
pub mod errors;
pub mod package_info;

pub use encode::{Lockfile, LockfileError, Pin, PinState};
pub use errors::ResolverFailure;
pub use package_info::{PackageInfo, WorkspaceState};

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use semver::Version;

use crate::ops::manifest::format_tools_version;
use crate::util::config::Config;
use crate::util::process::{find_swift, ProcessBuilder, ProcessOutput};

/// Operations quay needs from the package manager.
///
/// Failures are opaque and never retried.
pub trait PackageResolver {
    /// Resolve dependencies, honoring an existing `Package.resolved`.
    fn resolve(&self, working_dir: &Path) -> Result<(), ResolverFailure>;

    /// Resolve dependencies to the newest allowed versions.
    fn update(&self, working_dir: &Path) -> Result<(), ResolverFailure>;

    /// Set the manifest's tools version; `None` selects the toolchain's own.
    fn set_tools_version(
        &self,
        working_dir: &Path,
        version: Option<&Version>,
    ) -> Result<(), ResolverFailure>;

    /// Describe the package at `package_path`.
    fn load_package_info(&self, package_path: &Path) -> Result<PackageInfo, ResolverFailure>;
}

/// Package resolver backed by the `swift` command line tool.
#[derive(Debug, Clone)]
pub struct SwiftPackageResolver {
    swift: PathBuf,
}

impl SwiftPackageResolver {
    pub fn new(swift: impl Into<PathBuf>) -> Self {
        SwiftPackageResolver {
            swift: swift.into(),
        }
    }

    /// Locate `swift`: the configured executable, then `SWIFT_EXEC`, then PATH.
    pub fn locate(config: &Config) -> Result<Self> {
        if let Some(ref executable) = config.resolver.executable {
            return Ok(Self::new(executable));
        }

        find_swift()
            .map(Self::new)
            .ok_or_else(|| anyhow!("could not find `swift` in PATH; set SWIFT_EXEC or `resolver.executable`"))
    }

    pub fn executable(&self) -> &Path {
        &self.swift
    }

    fn package(&self, package_path: &Path) -> ProcessBuilder {
        ProcessBuilder::new(&self.swift)
            .arg("package")
            .arg("--package-path")
            .arg(package_path)
    }

    fn run(&self, cmd: ProcessBuilder) -> Result<ProcessOutput, ResolverFailure> {
        let command = cmd.display_command();
        let output = cmd
            .exec()
            .map_err(|e| ResolverFailure::new(&command, None, format!("{:#}", e)))?;

        if output.success() {
            Ok(output)
        } else {
            Err(ResolverFailure::new(command, output.code, output.stderr))
        }
    }
}

impl PackageResolver for SwiftPackageResolver {
    fn resolve(&self, working_dir: &Path) -> Result<(), ResolverFailure> {
        self.run(self.package(working_dir).arg("resolve"))?;
        Ok(())
    }

    fn update(&self, working_dir: &Path) -> Result<(), ResolverFailure> {
        self.run(self.package(working_dir).arg("update"))?;
        Ok(())
    }

    fn set_tools_version(
        &self,
        working_dir: &Path,
        version: Option<&Version>,
    ) -> Result<(), ResolverFailure> {
        let cmd = self.package(working_dir).arg("tools-version");
        let cmd = match version {
            Some(v) => cmd.arg("--set").arg(format_tools_version(v)),
            None => cmd.arg("--set-current"),
        };
        self.run(cmd)?;
        Ok(())
    }

    fn load_package_info(&self, package_path: &Path) -> Result<PackageInfo, ResolverFailure> {
        let cmd = self.package(package_path).arg("dump-package");
        let command = cmd.display_command();
        let output = self.run(cmd)?;

        serde_json::from_str(&output.stdout).map_err(|e| {
            ResolverFailure::new(command, output.code, format!("invalid package description: {}", e))
        })
    }
}
