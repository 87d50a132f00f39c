//! `quay manifest` command

use anyhow::Result;

use super::{configured_tools_version, load_workspace};
use quay::ops::build_manifest;
use quay::util::GlobalContext;

pub fn execute(ctx: &GlobalContext) -> Result<()> {
    let ws = load_workspace(ctx)?;
    let configured = configured_tools_version(ctx, &ws)?;
    let tools_version = configured.as_ref().or(ws.dependencies().tools_version.as_ref());

    print!("{}", build_manifest(ws.dependencies(), tools_version)?);
    Ok(())
}
