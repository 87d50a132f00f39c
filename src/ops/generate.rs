//! Merge the installed dependency graph with the workspace and derive schemes.

use std::path::Path;

use anyhow::{bail, Result};

use crate::core::declaration::Dependencies;
use crate::core::scheme::Scheme;
use crate::core::workspace::Workspace;
use crate::graph::{merge, DependencyGraph, GraphGenerator, UnifiedGraph};
use crate::ops::lockfile::{DependencyPaths, LockfileStore};
use crate::resolver::PackageResolver;
use crate::scheme::{SchemeSynthesizer, SideEffect};
use crate::util::fs::FileSystem;

/// Output of `generate`.
#[derive(Debug)]
pub struct Generation {
    pub graph: UnifiedGraph,
    pub schemes: Vec<Scheme>,
    pub side_effects: Vec<SideEffect>,
}

/// Rebuild the dependency graph from a previous install.
///
/// A workspace that declares no packages needs no install and gets an
/// empty graph.
pub fn load_dependency_graph(
    fs: &dyn FileSystem,
    resolver: &dyn PackageResolver,
    dependencies_dir: &Path,
    dependencies: &Dependencies,
) -> Result<DependencyGraph> {
    let paths = DependencyPaths::new(dependencies_dir);

    if !fs.is_dir(&paths.build_dir) {
        if dependencies.packages.is_empty() {
            return Ok(DependencyGraph::new(dependencies.tools_version.clone()));
        }
        bail!(
            "dependencies are not installed (no {}); run `quay install` first",
            paths.build_dir.display()
        );
    }

    let lockfile = LockfileStore::new(fs).load(&paths.lockfile)?;
    let graph = GraphGenerator::new(fs, resolver).generate(
        &paths.build_dir,
        dependencies,
        lockfile.as_ref(),
    )?;
    Ok(graph)
}

/// Merge `external` into `workspace` and synthesize its schemes.
pub fn generate(workspace: &Workspace, external: &DependencyGraph) -> Result<Generation> {
    let graph = merge(external, workspace.projects())?;

    let synthesizer =
        SchemeSynthesizer::new(workspace.code_coverage(), workspace.coverage_mode().clone());
    let (schemes, side_effects) = synthesizer.synthesize(workspace.name(), &graph);

    tracing::info!(
        "Generated {} scheme(s) over {} target(s)",
        schemes.len(),
        graph.targets().len()
    );

    Ok(Generation {
        graph,
        schemes,
        side_effects,
    })
}

/// Apply the side effects returned by scheme synthesis.
pub fn apply_side_effects(fs: &dyn FileSystem, side_effects: &[SideEffect]) -> Result<()> {
    for effect in side_effects {
        match effect {
            SideEffect::WriteFile { path, contents } => {
                tracing::debug!("writing {}", path.display());
                fs.write(path, contents)?;
            }
            SideEffect::Delete { path } => {
                tracing::debug!("deleting {}", path.display());
                fs.remove(path)?;
            }
        }
    }
    Ok(())
}
