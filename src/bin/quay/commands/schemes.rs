//! `quay schemes` command

use std::path::Path;

use anyhow::Result;

use super::{installed_resolver, load_workspace};
use crate::cli::SchemesArgs;
use quay::core::{Scheme, TargetReference};
use quay::ops::{generate, load_dependency_graph};
use quay::util::fs::relative_path;
use quay::util::{GlobalContext, RealFileSystem};

pub fn execute(args: SchemesArgs, ctx: &GlobalContext) -> Result<()> {
    let ws = load_workspace(ctx)?;
    let resolver = installed_resolver(ctx, &ws);

    let external =
        load_dependency_graph(&RealFileSystem, &resolver, &ws.dependencies_dir(), ws.dependencies())?;
    let generation = generate(&ws, &external)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&generation.schemes)?);
        return Ok(());
    }

    if generation.schemes.is_empty() {
        eprintln!("No targets; no schemes generated");
    }
    for scheme in &generation.schemes {
        print_scheme(scheme, ws.root());
    }

    Ok(())
}

fn print_scheme(scheme: &Scheme, root: &Path) {
    println!("{}", scheme.name);
    for target in scheme.build_targets() {
        println!("  build  {}", display_target(target, root));
    }
    for testable in scheme.test_targets() {
        println!("  test   {}", display_target(&testable.target, root));
    }
    if let Some(test) = &scheme.test_action {
        if test.coverage {
            println!("  coverage enabled");
        }
    }
}

/// `App:AppTests`, with the project path relative to the workspace root.
fn display_target(target: &TargetReference, root: &Path) -> String {
    format!(
        "{}:{}",
        relative_path(root, &target.project_path).display(),
        target.name
    )
}
