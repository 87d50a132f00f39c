//! quay - third-party dependency graphs and schemes for Swift workspaces
//!
//! This crate provides the core library functionality for quay: declaring
//! Swift packages, driving the package manager, building the dependency
//! graph, merging it with the workspace's own targets and synthesizing
//! schemes.

pub mod core;
pub mod graph;
pub mod ops;
pub mod resolver;
pub mod scheme;
pub mod util;

/// Test utilities and mocks for quay unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides an in-memory filesystem and a simulated
/// package manager.
#[cfg(test)]
pub mod test_support;

pub use core::{Dependencies, Project, Target, TargetReference, Workspace};
pub use graph::{DependencyGraph, GraphError, UnifiedGraph};
pub use resolver::{PackageResolver, SwiftPackageResolver};
pub use util::context::GlobalContext;
