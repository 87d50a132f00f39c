//! Core data structures for quay.
//!
//! This module contains the foundational types used throughout quay:
//! - Package declarations and dependency specifications
//! - Platforms, deployment targets and product types
//! - Projects, targets and target references
//! - Schemes
//! - Workspace loading

pub mod declaration;
pub mod manifest;
pub mod platform;
pub mod product;
pub mod project;
pub mod scheme;
pub mod target;
pub mod workspace;

pub use declaration::{Dependencies, PackageDeclaration, PackageSource, Requirement};
pub use manifest::Manifest;
pub use platform::{OsVersion, Platform};
pub use product::ProductType;
pub use project::Project;
pub use scheme::{BuildAction, CoverageMode, Scheme, TestAction, TestableTarget};
pub use target::{Target, TargetDependency, TargetReference};
pub use workspace::{find_manifest, Workspace, DEPENDENCIES_DIR, MANIFEST_NAME};
