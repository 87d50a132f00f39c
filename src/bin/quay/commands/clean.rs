//! `quay clean` command

use anyhow::Result;

use super::load_workspace;
use quay::ops::clean;
use quay::util::{GlobalContext, RealFileSystem};

pub fn execute(ctx: &GlobalContext) -> Result<()> {
    let ws = load_workspace(ctx)?;
    let dependencies_dir = ws.dependencies_dir();

    clean(&RealFileSystem, &dependencies_dir)?;
    eprintln!("     Removed {}", dependencies_dir.display());

    Ok(())
}
