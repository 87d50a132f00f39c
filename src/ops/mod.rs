//! High-level operations.
//!
//! This module contains the implementation of quay commands.

pub mod generate;
pub mod install;
pub mod lockfile;
pub mod manifest;

pub use generate::{apply_side_effects, generate, load_dependency_graph, Generation};
pub use install::{clean, InstallOptions, InstallReport, Installer};
pub use lockfile::{DependencyPaths, InstallError, LockfileStore};
pub use manifest::{build_manifest, set_tools_version};
