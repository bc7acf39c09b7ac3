//! CLI command definitions.
//!
//! Each subcommand maps to one provisioning or verification workflow.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod apply;
pub mod deploy;
pub mod env;
pub mod preflight;
pub mod smoke;
mod workspace;

pub use workspace::Workspace;

/// launchkit - provision, configure and verify a Worker deployment
#[derive(Parser)]
#[command(name = "launch")]
#[command(version, about = "launchkit - provision, configure and verify a Worker deployment")]
#[command(long_about = r#"
launchkit resolves layered project configuration, reconciles the project's
D1 database and R2 bucket with the provider account, renders wrangler.toml,
and verifies the live deployment.

WORKFLOWS:
  preflight     → Resolve configuration, detect capabilities, print the plan
  apply         → Reconcile resources and write generated files
  env generate  → Write .env.generated and .dev.vars
  deploy        → Render wrangler.toml and publish the Worker
  smoke         → Probe the live deployment and write a report

EXIT CODES:
  0 - Success
  1 - Any failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project directory
    #[arg(long, global = true, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve configuration, detect provider capabilities and print the plan
    Preflight(preflight::PreflightArgs),

    /// Reconcile resources and write generated files
    Apply(apply::ApplyArgs),

    /// Generated environment files
    Env(EnvArgs),

    /// Render wrangler.toml and publish the Worker
    Deploy(deploy::DeployArgs),

    /// Verify a live deployment
    Smoke(smoke::SmokeArgs),
}

#[derive(Args)]
pub struct EnvArgs {
    #[command(subcommand)]
    pub command: EnvCommands,
}

#[derive(Subcommand)]
pub enum EnvCommands {
    /// Write .env.generated and .dev.vars
    Generate(env::GenerateArgs),
}
