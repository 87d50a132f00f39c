//! Autogenerated workspace schemes.
//!
//! Every workspace gets a shared scheme that builds all of its targets and
//! runs all of its tests. A scheme can only build for one platform, so a
//! workspace spanning several platforms gets one scheme per platform.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::platform::Platform;
use crate::core::scheme::{BuildAction, CoverageMode, Scheme, TestAction, TestableTarget};
use crate::core::target::TargetReference;
use crate::graph::{MappedTarget, UnifiedGraph};

/// A change to the filesystem the caller must apply along with the schemes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Write `contents` to `path`
    WriteFile { path: PathBuf, contents: Vec<u8> },

    /// Delete `path`
    Delete { path: PathBuf },
}

/// Derives the autogenerated schemes of a workspace.
#[derive(Debug, Clone, Default)]
pub struct SchemeSynthesizer {
    pub enable_coverage: bool,
    pub coverage_mode: CoverageMode,
}

impl SchemeSynthesizer {
    pub fn new(enable_coverage: bool, coverage_mode: CoverageMode) -> Self {
        SchemeSynthesizer {
            enable_coverage,
            coverage_mode,
        }
    }

    /// Schemes for every target of `graph`, sorted by name.
    ///
    /// Named `<workspace>-Project` when all targets share a platform, and
    /// `<workspace>-Project-<platform>` otherwise.
    pub fn synthesize(
        &self,
        workspace_name: &str,
        graph: &UnifiedGraph,
    ) -> (Vec<Scheme>, Vec<SideEffect>) {
        let mut by_platform: BTreeMap<Platform, Vec<&MappedTarget>> = BTreeMap::new();
        for target in graph.targets() {
            by_platform.entry(target.platform()).or_default().push(target);
        }

        let single = by_platform.len() == 1;
        let mut schemes: Vec<Scheme> = by_platform
            .into_iter()
            .map(|(platform, mut targets)| {
                targets.sort_by(|a, b| {
                    a.reference
                        .name
                        .cmp(&b.reference.name)
                        .then_with(|| a.reference.project_path.cmp(&b.reference.project_path))
                });

                let name = if single {
                    format!("{}-Project", workspace_name)
                } else {
                    format!("{}-Project-{}", workspace_name, platform)
                };
                self.scheme(name, platform, &targets)
            })
            .collect();

        schemes.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!(
            "synthesized {} scheme(s) for workspace `{}`",
            schemes.len(),
            workspace_name
        );

        (schemes, Vec::new())
    }

    fn scheme(&self, name: String, platform: Platform, targets: &[&MappedTarget]) -> Scheme {
        let build_targets: Vec<TargetReference> =
            targets.iter().map(|t| t.reference.clone()).collect();

        let test_targets: Vec<TestableTarget> = targets
            .iter()
            .filter(|t| t.product().is_test())
            .map(|t| TestableTarget::new(t.reference.clone()))
            .collect();

        let coverage = self.enable_coverage && self.coverage_mode != CoverageMode::None;
        let coverage_targets = match &self.coverage_mode {
            CoverageMode::Selected(selected) => {
                let mut refs: Vec<TargetReference> = selected
                    .iter()
                    .filter(|r| {
                        targets
                            .iter()
                            .any(|t| &t.reference == *r && t.platform() == platform)
                    })
                    .cloned()
                    .collect();
                refs.dedup();
                refs
            }
            CoverageMode::All | CoverageMode::None => Vec::new(),
        };

        Scheme {
            name,
            shared: true,
            build_action: Some(BuildAction {
                targets: build_targets,
            }),
            test_action: Some(TestAction {
                targets: test_targets,
                coverage,
                coverage_targets,
            }),
        }
    }
}
