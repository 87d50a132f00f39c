//! Command implementations

pub mod clean;
pub mod graph;
pub mod install;
pub mod manifest;
pub mod schemes;

use anyhow::Result;
use semver::Version;

use quay::core::declaration::parse_requirement_version;
use quay::core::Workspace;
use quay::resolver::SwiftPackageResolver;
use quay::util::GlobalContext;

/// Load the workspace containing the current directory.
pub fn load_workspace(ctx: &GlobalContext) -> Result<Workspace> {
    let manifest_path = ctx.find_manifest()?;
    Workspace::new(&manifest_path, ctx)
}

/// Tools version from `.quay/config.toml`, used when Quay.toml sets none.
pub fn configured_tools_version(ctx: &GlobalContext, ws: &Workspace) -> Result<Option<Version>> {
    if ws.dependencies().tools_version.is_some() {
        return Ok(None);
    }

    let config = ctx.config(ws.root());
    let version = config
        .resolver
        .tools_version
        .as_deref()
        .map(|v| parse_requirement_version("tools-version", v))
        .transpose()?;
    Ok(version)
}

/// The package resolver, for commands that only need it after an install.
pub fn installed_resolver(ctx: &GlobalContext, ws: &Workspace) -> SwiftPackageResolver {
    let config = ctx.config(ws.root());
    SwiftPackageResolver::locate(&config).unwrap_or_else(|e| {
        tracing::debug!("{:#}", e);
        SwiftPackageResolver::new("swift")
    })
}
