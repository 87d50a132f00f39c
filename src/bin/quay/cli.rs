//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};

/// quay - third-party dependency graphs and schemes for Swift workspaces
#[derive(Parser)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve and install third-party packages
    Install(InstallArgs),

    /// Remove the package manager state and the lockfile
    Clean,

    /// Print the generated Package.swift
    Manifest,

    /// Print the unified dependency graph as JSON
    Graph,

    /// Print the autogenerated schemes
    Schemes(SchemesArgs),
}

#[derive(Args)]
pub struct InstallArgs {
    /// Resolve to the newest allowed versions, ignoring the lockfile
    #[arg(long)]
    pub update: bool,
}

#[derive(Args)]
pub struct SchemesArgs {
    /// Print schemes as JSON
    #[arg(long)]
    pub json: bool,
}
