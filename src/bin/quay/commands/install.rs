//! `quay install` command

use anyhow::Result;

use super::{configured_tools_version, load_workspace};
use crate::cli::InstallArgs;
use quay::ops::{apply_side_effects, generate, InstallOptions, Installer};
use quay::resolver::SwiftPackageResolver;
use quay::util::{GlobalContext, RealFileSystem};

pub fn execute(args: InstallArgs, ctx: &GlobalContext) -> Result<()> {
    let ws = load_workspace(ctx)?;
    let config = ctx.config(ws.root());
    let resolver = SwiftPackageResolver::locate(&config)?;
    let fs = RealFileSystem;

    let opts = InstallOptions {
        should_update: args.update,
        tools_version: configured_tools_version(ctx, &ws)?,
    };

    let report = Installer::new(&fs, &resolver).install(&ws.dependencies_dir(), ws.dependencies(), &opts)?;
    let generation = generate(&ws, &report.graph)?;
    apply_side_effects(&fs, &generation.side_effects)?;

    eprintln!(
        "   Installed {} packages, {} products",
        report.graph.packages().count(),
        report.graph.len()
    );
    if let Some(digest) = report.lockfile_digest {
        eprintln!("    Lockfile sha256:{}", digest);
    }

    Ok(())
}
