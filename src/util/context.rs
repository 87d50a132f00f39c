//! Global context for quay operations.
//!
//! Provides centralized access to configuration and the working directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::workspace::{find_manifest as ws_find_manifest, ManifestError};
use crate::util::config::{self, Config};

/// Global context shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext { cwd })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext { cwd }
    }

    /// Load the merged global and project configuration for `project_root`.
    pub fn config(&self, project_root: &Path) -> Config {
        let global = config::global_config_path();
        config::load_config(global.as_deref(), &config::project_config_path(project_root))
    }

    /// Find Quay.toml starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        let mut current = self.cwd.clone();
        loop {
            match ws_find_manifest(&current) {
                Ok(path) => return Ok(path),
                Err(ManifestError::NotFound { .. }) => {
                    if !current.pop() {
                        return Err(ManifestError::NotFound {
                            dir: self.cwd.clone(),
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_manifest_searches_upward() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("Quay.toml");
        std::fs::write(&manifest, "[workspace]\nname = \"test\"\n").unwrap();
        let nested = tmp.path().join("App/Sources");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested);
        assert_eq!(ctx.find_manifest().ok(), Some(manifest));
    }

    #[test]
    fn test_project_config_is_loaded() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".quay")).unwrap();
        std::fs::write(
            tmp.path().join(".quay/config.toml"),
            "[resolver]\nexecutable = \"/opt/swift/bin/swift\"\n",
        )
        .unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let config = ctx.config(tmp.path());
        assert_eq!(
            config.resolver.executable,
            Some(PathBuf::from("/opt/swift/bin/swift"))
        );
    }
}
