//! launchkit CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Any failure (validation, reconciliation, rendering, drift, verification)

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands, EnvCommands, Workspace};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let result = match Workspace::new(cli.dir) {
        Ok(workspace) => match cli.command {
            Commands::Preflight(args) => commands::preflight::execute(&workspace, args).await,
            Commands::Apply(args) => commands::apply::execute(&workspace, args).await,
            Commands::Env(env) => match env.command {
                EnvCommands::Generate(args) => commands::env::generate(&workspace, args).await,
            },
            Commands::Deploy(args) => commands::deploy::execute(&workspace, args).await,
            Commands::Smoke(args) => commands::smoke::execute(&workspace, args).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env();
    for directive in [format!("launch={}", level), "warn".to_string()] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    let registry = tracing_subscriber::registry().with(filter);
    // Logging may already be initialized; continue either way
    let _ = if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
}
