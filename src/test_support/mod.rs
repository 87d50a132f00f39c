//! Test utilities and mocks for quay unit tests.
//!
//! This module provides an in-memory [`FileSystem`] and a [`PackageResolver`]
//! that simulates the package manager, so the install pipeline can be tested
//! without a Swift toolchain.
//!
//! # Example
//!
//! ```rust,ignore
//! use quay::test_support::{FakeResolver, MockFileSystem};
//!
//! #[test]
//! fn test_example() {
//!     let fs = MockFileSystem::new();
//!     let resolver = FakeResolver::new(fs.clone()).with_lockfile(lockfile_json(&[]));
//!
//!     // Use mocks in tests...
//! }
//! ```

pub mod fixtures;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, bail, Result};
use semver::Version;

use crate::ops::manifest::set_tools_version;
use crate::resolver::{PackageInfo, PackageResolver, ResolverFailure};
use crate::util::fs::FileSystem;

// Re-export fixtures for convenience
pub use fixtures::*;

#[derive(Debug, Default)]
struct FsState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl FsState {
    fn add_dir(&mut self, path: &Path) {
        let mut current = Some(path);
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(dir.to_path_buf());
            current = dir.parent();
        }
    }
}

/// Mock filesystem for testing without real I/O.
///
/// Clones share the same in-memory state, so a test can hand one clone to
/// the code under test and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<FsState>>,
}

impl MockFileSystem {
    /// Create a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FsState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add a file with the given content, creating parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut state = self.state();
        if let Some(parent) = path.parent() {
            state.add_dir(parent);
        }
        state.files.insert(path.to_path_buf(), content.into());
    }

    /// Add a directory and all its parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.state().add_dir(path.as_ref());
    }

    /// A file's contents as a string, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state()
            .files
            .get(path.as_ref())
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Check if a path is a file.
    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        self.state().files.contains_key(path.as_ref())
    }

    /// All file paths (for debugging).
    pub fn all_files(&self) -> Vec<PathBuf> {
        self.state().files.keys().cloned().collect()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let state = self.state();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state().dirs.contains(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self
            .state()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("file not found: {}", path.display()))?;
        String::from_utf8(bytes).map_err(|e| anyhow!("invalid UTF-8: {}", e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.state();
        let contents = state
            .files
            .get(from)
            .cloned()
            .ok_or_else(|| anyhow!("file not found: {}", from.display()))?;
        if let Some(parent) = to.parent() {
            if !parent.as_os_str().is_empty() && !state.dirs.contains(parent) {
                bail!("parent directory does not exist: {}", parent.display());
            }
        }
        state.files.insert(to.to_path_buf(), contents);
        Ok(())
    }

    fn replace(&self, to: &Path, with: &Path) -> Result<()> {
        let mut state = self.state();
        let contents = state
            .files
            .get(with)
            .cloned()
            .ok_or_else(|| anyhow!("file not found: {}", with.display()))?;
        if !state.files.contains_key(to) {
            bail!("file not found: {}", to.display());
        }
        state.files.insert(to.to_path_buf(), contents);
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let mut state = self.state();
        state.files.retain(|p, _| !p.starts_with(path));
        state.dirs.retain(|d| !d.starts_with(path));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FakeState {
    lockfile: Option<String>,
    workspace_state: Option<String>,
    build_dir: bool,
    failure: Option<ResolverFailure>,
    package_infos: HashMap<PathBuf, PackageInfo>,
    calls: Vec<String>,
}

/// Simulated package manager.
///
/// On `resolve` it creates `.build`, writes the configured workspace state
/// and, unless the working directory already has one, the configured
/// `Package.resolved`. `update` always overwrites the lockfile. Every call
/// is recorded.
#[derive(Debug)]
pub struct FakeResolver {
    fs: MockFileSystem,
    state: Mutex<FakeState>,
}

impl FakeResolver {
    /// The tools version `set_tools_version(None)` writes.
    pub const CURRENT_TOOLS_VERSION: Version = Version::new(5, 5, 0);

    pub fn new(fs: MockFileSystem) -> Self {
        FakeResolver {
            fs,
            state: Mutex::new(FakeState {
                build_dir: true,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Lockfile text produced by resolution.
    pub fn with_lockfile(self, contents: impl Into<String>) -> Self {
        self.state().lockfile = Some(contents.into());
        self
    }

    /// `workspace-state.json` text produced by resolution.
    pub fn with_workspace_state(self, contents: impl Into<String>) -> Self {
        self.state().workspace_state = Some(contents.into());
        self
    }

    /// Skip creating `.build`, as a broken toolchain would.
    pub fn without_build_dir(self) -> Self {
        self.state().build_dir = false;
        self
    }

    /// Make `resolve` and `update` fail.
    pub fn failing(self, stderr: impl Into<String>) -> Self {
        self.state().failure = Some(ResolverFailure::new(
            "swift package resolve",
            Some(1),
            stderr,
        ));
        self
    }

    /// Register the description `dump-package` returns for `path`.
    pub fn with_package(self, path: impl Into<PathBuf>, info: PackageInfo) -> Self {
        self.state().package_infos.insert(path.into(), info);
        self
    }

    /// Commands run so far, e.g. `resolve /deps/SwiftPackageManager`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn run(&self, command: &str, working_dir: &Path, overwrite_lockfile: bool) -> Result<(), ResolverFailure> {
        let state = {
            let mut state = self.state();
            state
                .calls
                .push(format!("{} {}", command, working_dir.display()));
            if let Some(ref failure) = state.failure {
                return Err(failure.clone());
            }
            (state.build_dir, state.workspace_state.clone(), state.lockfile.clone())
        };
        let (build_dir, workspace_state, lockfile) = state;
        let io = |e: anyhow::Error| ResolverFailure::new(command, None, e.to_string());

        if build_dir {
            let build = working_dir.join(".build");
            self.fs.create_dir_all(&build).map_err(io)?;
            if let Some(contents) = workspace_state {
                self.fs
                    .write(&build.join("workspace-state.json"), contents.as_bytes())
                    .map_err(io)?;
            }
        }

        if let Some(contents) = lockfile {
            let path = working_dir.join("Package.resolved");
            if overwrite_lockfile || !self.fs.exists(&path) {
                self.fs.write(&path, contents.as_bytes()).map_err(io)?;
            }
        }

        Ok(())
    }
}

impl PackageResolver for FakeResolver {
    fn resolve(&self, working_dir: &Path) -> Result<(), ResolverFailure> {
        self.run("resolve", working_dir, false)
    }

    fn update(&self, working_dir: &Path) -> Result<(), ResolverFailure> {
        self.run("update", working_dir, true)
    }

    fn set_tools_version(
        &self,
        working_dir: &Path,
        version: Option<&Version>,
    ) -> Result<(), ResolverFailure> {
        let version = version.cloned().unwrap_or(Self::CURRENT_TOOLS_VERSION);
        self.state()
            .calls
            .push(format!("tools-version {} {}", version, working_dir.display()));

        let manifest = working_dir.join("Package.swift");
        let failure = |e: anyhow::Error| ResolverFailure::new("tools-version", Some(1), e.to_string());
        let text = self.fs.read_to_string(&manifest).map_err(failure)?;
        self.fs
            .write(&manifest, set_tools_version(&text, &version).as_bytes())
            .map_err(failure)
    }

    fn load_package_info(&self, package_path: &Path) -> Result<PackageInfo, ResolverFailure> {
        self.state()
            .package_infos
            .get(package_path)
            .cloned()
            .ok_or_else(|| {
                ResolverFailure::new(
                    format!("swift package --package-path {} dump-package", package_path.display()),
                    Some(1),
                    "error: Could not find Package.swift in this directory",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_filesystem_basic() {
        let fs = MockFileSystem::new();
        fs.add_file("/work/Quay.toml", "[workspace]");

        assert!(fs.exists(Path::new("/work/Quay.toml")));
        assert!(fs.is_dir(Path::new("/work")));
        assert_eq!(fs.contents("/work/Quay.toml").as_deref(), Some("[workspace]"));
    }

    #[test]
    fn test_mock_filesystem_copy_needs_parent() {
        let fs = MockFileSystem::new();
        fs.add_file("/a/file", "x");

        assert!(fs.copy(Path::new("/a/file"), Path::new("/b/file")).is_err());
        fs.create_dir_all(Path::new("/b")).unwrap();
        fs.copy(Path::new("/a/file"), Path::new("/b/file")).unwrap();
        assert_eq!(fs.contents("/b/file").as_deref(), Some("x"));
    }

    #[test]
    fn test_mock_filesystem_remove_tree() {
        let fs = MockFileSystem::new();
        fs.add_file("/deps/work/.build/state.json", "{}");
        fs.add_file("/deps/keep", "");

        fs.remove(Path::new("/deps/work")).unwrap();
        assert!(!fs.exists(Path::new("/deps/work/.build")));
        assert!(fs.exists(Path::new("/deps/keep")));
        fs.remove(Path::new("/deps/work")).unwrap();
    }

    #[test]
    fn test_fake_resolver_keeps_existing_lockfile_on_resolve() {
        let fs = MockFileSystem::new();
        fs.add_file("/deps/work/Package.resolved", "old");
        let resolver = FakeResolver::new(fs.clone()).with_lockfile("new");

        resolver.resolve(Path::new("/deps/work")).unwrap();
        assert_eq!(fs.contents("/deps/work/Package.resolved").as_deref(), Some("old"));
        assert!(fs.is_dir(Path::new("/deps/work/.build")));

        resolver.update(Path::new("/deps/work")).unwrap();
        assert_eq!(fs.contents("/deps/work/Package.resolved").as_deref(), Some("new"));
        assert_eq!(
            resolver.calls(),
            vec!["resolve /deps/work", "update /deps/work"]
        );
    }

    #[test]
    fn test_fake_resolver_failure() {
        let resolver = FakeResolver::new(MockFileSystem::new()).failing("boom");
        let err = resolver.resolve(Path::new("/deps/work")).unwrap_err();
        assert_eq!(err.stderr, "boom");
    }
}
