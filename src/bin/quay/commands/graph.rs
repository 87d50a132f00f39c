//! `quay graph` command

use anyhow::Result;

use super::{installed_resolver, load_workspace};
use quay::ops::{generate, load_dependency_graph};
use quay::util::{GlobalContext, RealFileSystem};

pub fn execute(ctx: &GlobalContext) -> Result<()> {
    let ws = load_workspace(ctx)?;
    let resolver = installed_resolver(ctx, &ws);

    let external =
        load_dependency_graph(&RealFileSystem, &resolver, &ws.dependencies_dir(), ws.dependencies())?;
    let generation = generate(&ws, &external)?;

    println!("{}", serde_json::to_string_pretty(&generation.graph.summary())?);
    Ok(())
}
