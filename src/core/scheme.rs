//! Schemes - named build/test configurations over a set of targets.

use serde::{Deserialize, Serialize};

use crate::core::target::TargetReference;

/// Which targets gather code coverage when tests run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageMode {
    /// Every target in the scheme
    #[default]
    All,

    /// Coverage disabled regardless of the workspace flag
    None,

    /// Only the listed targets
    Selected(Vec<TargetReference>),
}

/// A test target inside a test action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestableTarget {
    pub target: TargetReference,

    #[serde(default)]
    pub skipped: bool,
}

impl TestableTarget {
    pub fn new(target: TargetReference) -> Self {
        TestableTarget {
            target,
            skipped: false,
        }
    }
}

/// The targets a scheme builds, in build order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildAction {
    pub targets: Vec<TargetReference>,
}

/// The test bundles a scheme runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestAction {
    pub targets: Vec<TestableTarget>,

    /// Whether code coverage is gathered
    pub coverage: bool,

    /// Targets contributing to coverage; empty means all targets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coverage_targets: Vec<TargetReference>,
}

/// A build/test configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    pub name: String,

    /// Shared schemes are visible to every user of the workspace
    pub shared: bool,

    pub build_action: Option<BuildAction>,

    pub test_action: Option<TestAction>,
}

impl Scheme {
    /// Targets built by this scheme, or an empty slice.
    pub fn build_targets(&self) -> &[TargetReference] {
        self.build_action
            .as_ref()
            .map(|a| a.targets.as_slice())
            .unwrap_or(&[])
    }

    /// Tests run by this scheme, or an empty slice.
    pub fn test_targets(&self) -> &[TestableTarget] {
        self.test_action
            .as_ref()
            .map(|a| a.targets.as_slice())
            .unwrap_or(&[])
    }
}
