//! Lockfile I/O operations.
//!
//! The persisted lockfile lives in `<deps>/Lockfiles/Package.resolved`. The
//! package manager only sees the copy inside its working directory, so
//! every install stages the persisted copy in and commits the result back.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::declaration::Dependencies;
use crate::resolver::encode::Lockfile;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::{copy_or_replace, FileSystem};

/// File name of the lockfile.
pub const LOCKFILE_NAME: &str = "Package.resolved";

/// Directory under the dependencies dir holding persisted lockfiles.
pub const LOCKFILES_DIR: &str = "Lockfiles";

/// The package manager's working directory under the dependencies dir.
pub const WORKING_DIR: &str = "SwiftPackageManager";

/// The generated package manifest.
pub const PACKAGE_MANIFEST_NAME: &str = "Package.swift";

/// Build artifacts directory written by the package manager.
pub const BUILD_DIR: &str = ".build";

/// Paths derived from a dependencies directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPaths {
    /// `<deps>/SwiftPackageManager`
    pub working_dir: PathBuf,

    /// `<deps>/SwiftPackageManager/Package.resolved`
    pub working_lockfile: PathBuf,

    /// `<deps>/SwiftPackageManager/Package.swift`
    pub manifest: PathBuf,

    /// `<deps>/SwiftPackageManager/.build`
    pub build_dir: PathBuf,

    /// `<deps>/Lockfiles/Package.resolved`
    pub lockfile: PathBuf,
}

impl DependencyPaths {
    pub fn new(dependencies_dir: &Path) -> Self {
        let working_dir = dependencies_dir.join(WORKING_DIR);
        DependencyPaths {
            working_lockfile: working_dir.join(LOCKFILE_NAME),
            manifest: working_dir.join(PACKAGE_MANIFEST_NAME),
            build_dir: working_dir.join(BUILD_DIR),
            lockfile: dependencies_dir.join(LOCKFILES_DIR).join(LOCKFILE_NAME),
            working_dir,
        }
    }
}

/// The package manager ran but left the working directory incomplete.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallError {
    #[error("The Package.resolved lockfile was not found after resolving the dependencies using the Swift Package Manager.")]
    LockfileMissing { path: PathBuf },

    #[error("The .build directory was not found after resolving the dependencies using the Swift Package Manager")]
    BuildArtifactsMissing { path: PathBuf },
}

impl InstallError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let path = match self {
            InstallError::LockfileMissing { path } | InstallError::BuildArtifactsMissing { path } => {
                path
            }
        };
        Diagnostic::error(self.to_string())
            .with_location(path.clone())
            .with_suggestion(suggestions::REINSTALL)
    }
}

/// Moves lockfiles between the persisted location and the working directory.
pub struct LockfileStore<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> LockfileStore<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        LockfileStore { fs }
    }

    /// Load the lockfile at `path`, or `None` if there is none.
    pub fn load(&self, path: &Path) -> Result<Option<Lockfile>> {
        if !self.fs.exists(path) {
            return Ok(None);
        }

        let raw = self.fs.read_to_string(path)?;
        let lockfile = Lockfile::parse(&raw)
            .with_context(|| format!("failed to parse lockfile: {}", path.display()))?;
        Ok(Some(lockfile))
    }

    /// Copy the persisted lockfile into the working directory.
    pub fn stage(&self, paths: &DependencyPaths) -> Result<()> {
        if !self.fs.exists(&paths.lockfile) {
            return Ok(());
        }

        tracing::debug!("staging {}", paths.lockfile.display());
        copy_or_replace(self.fs, &paths.lockfile, &paths.working_lockfile)
            .context("failed to stage lockfile")
    }

    /// Validate the working directory and persist its lockfile.
    ///
    /// Nothing is written unless validation passes.
    pub fn commit(&self, paths: &DependencyPaths, requires_remote: bool) -> Result<()> {
        let has_lockfile = self.fs.exists(&paths.working_lockfile);

        if requires_remote && !has_lockfile {
            return Err(InstallError::LockfileMissing {
                path: paths.working_lockfile.clone(),
            }
            .into());
        }
        if !self.fs.is_dir(&paths.build_dir) {
            return Err(InstallError::BuildArtifactsMissing {
                path: paths.build_dir.clone(),
            }
            .into());
        }

        if has_lockfile {
            copy_or_replace(self.fs, &paths.working_lockfile, &paths.lockfile)
                .context("failed to save lockfile")?;
            tracing::debug!("saved {}", paths.lockfile.display());
        }

        Ok(())
    }
}

/// Check whether `lockfile` no longer covers the declared remote packages.
pub fn is_stale(lockfile: &Lockfile, dependencies: &Dependencies) -> bool {
    lockfile.is_stale_for(dependencies)
}
