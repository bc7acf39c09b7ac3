//! Deploy command - Render wrangler.toml and publish the Worker.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use launch_iac::Reconciler;
use launch_templates::generated;

use super::Workspace;

#[derive(Args)]
pub struct DeployArgs {
    /// Fail if wrangler.toml is out of date instead of rewriting it
    #[arg(long)]
    check: bool,

    /// Pass --dry-run to wrangler deploy
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(workspace: &Workspace, args: DeployArgs) -> Result<()> {
    info!("Deploying from {}", workspace.dir.display());

    let config = workspace.resolve()?;
    let file = generated::wrangler_file(&workspace.dir, &config, None)
        .context("Failed to render wrangler.toml")?;

    println!("📄 Deployment configuration");
    workspace.write(std::slice::from_ref(&file), args.check)?;

    let reconciler = Reconciler::new(workspace.provider(Some(&config))?);
    let output = reconciler.deploy(args.dry_run).await?;
    println!("{}", output.stdout.trim_end());

    if args.dry_run {
        println!("✅ Deploy dry run complete");
    } else {
        println!("🚀 Deployed");
    }
    Ok(())
}
