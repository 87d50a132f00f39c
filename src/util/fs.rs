//! Filesystem utilities.
//!
//! Operations that touch dependency state go through the [`FileSystem`]
//! trait so they can run against an in-memory filesystem in tests.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// File operations needed by the install pipeline.
pub trait FileSystem {
    /// Check if a file or directory exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Read a file as a string.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write a file atomically, creating parent directories.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Create a directory and all parents.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Copy a file. The destination's parent must exist.
    fn copy(&self, from: &Path, to: &Path) -> Result<()>;

    /// Atomically replace `to` with the contents of `with`.
    fn replace(&self, to: &Path, with: &Path) -> Result<()>;

    /// Remove a file or directory tree. Missing paths are not an error.
    fn remove(&self, path: &Path) -> Result<()>;
}

/// Copy `from` to `to`: atomic replace if `to` exists, otherwise create the
/// parent directories and copy.
pub fn copy_or_replace(fs: &dyn FileSystem, from: &Path, to: &Path) -> Result<()> {
    if fs.exists(to) {
        fs.replace(to, from)
    } else {
        if let Some(parent) = to.parent() {
            fs.create_dir_all(parent)?;
        }
        fs.copy(from, to)
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        atomic_write(path, contents)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        ensure_dir(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        fs::copy(from, to).with_context(|| {
            format!("failed to copy {} to {}", from.display(), to.display())
        })?;
        Ok(())
    }

    fn replace(&self, to: &Path, with: &Path) -> Result<()> {
        let contents = fs::read(with)
            .with_context(|| format!("failed to read file: {}", with.display()))?;
        atomic_write(to, &contents)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            remove_dir_all_if_exists(path)
        } else if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("failed to remove file: {}", path.display()))
        } else {
            Ok(())
        }
    }
}

/// Write a file by persisting a sibling temporary file over it.
///
/// Readers never observe a partially written file.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    ensure_dir(parent)?;

    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in: {}", parent.display()))?;
    temp.write_all(contents)
        .with_context(|| format!("failed to write temp file for: {}", path.display()))?;
    temp.as_file()
        .sync_all()
        .with_context(|| "failed to sync file to disk")?;
    temp.persist(path)
        .with_context(|| format!("failed to replace file: {}", path.display()))?;

    Ok(())
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}
