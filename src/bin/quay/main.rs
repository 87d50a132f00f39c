//! quay CLI - third-party dependency graphs and schemes for Swift workspaces

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use quay::core::workspace::ManifestError;
use quay::graph::GraphError;
use quay::ops::InstallError;
use quay::resolver::ResolverFailure;
use quay::util::diagnostic::{emit, suggestions, Diagnostic};
use quay::GlobalContext;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("quay=debug")
    } else {
        EnvFilter::new("quay=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let ctx = GlobalContext::new()?;

    match cli.command {
        Commands::Install(args) => commands::install::execute(args, &ctx),
        Commands::Clean => commands::clean::execute(&ctx),
        Commands::Manifest => commands::manifest::execute(&ctx),
        Commands::Graph => commands::graph::execute(&ctx),
        Commands::Schemes(args) => commands::schemes::execute(args, &ctx),
    }
}

/// Print `err`, as a diagnostic when quay knows how to explain it.
fn report(err: &anyhow::Error, color: bool) {
    let diagnostic = if let Some(e) = err.downcast_ref::<GraphError>() {
        Some(e.to_diagnostic())
    } else if let Some(e) = err.downcast_ref::<ResolverFailure>() {
        Some(e.to_diagnostic())
    } else if let Some(e) = err.downcast_ref::<InstallError>() {
        Some(e.to_diagnostic())
    } else {
        err.downcast_ref::<ManifestError>()
            .map(|e| Diagnostic::error(e.to_string()).with_suggestion(suggestions::NO_MANIFEST))
    };

    match diagnostic {
        Some(diagnostic) => emit(&diagnostic, color),
        None => eprintln!("error: {:#}", err),
    }
}
