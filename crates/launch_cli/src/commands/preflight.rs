//! Preflight command - Resolve configuration and print the provisioning plan.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use launch_iac::Reconciler;

use super::Workspace;

#[derive(Args)]
pub struct PreflightArgs {
    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(workspace: &Workspace, args: PreflightArgs) -> Result<()> {
    info!("Running preflight in {}", workspace.dir.display());

    let config = workspace.resolve()?;
    let reconciler = Reconciler::new(workspace.provider(Some(&config))?);

    let capabilities = reconciler.detect_capabilities(&config).await;
    let plan = Reconciler::build_plan(&config, &capabilities);

    if args.json {
        let out = serde_json::json!({
            "config": config.redacted_report(),
            "plan": plan,
        });
        println!("{}", serde_json::to_string_pretty(&out).context("Failed to serialize plan")?);
        return Ok(());
    }

    println!("📋 Configuration");
    println!("{}", config.redacted_report().summary);
    println!();

    println!("🔑 Provider access");
    match &capabilities.identity {
        Some(identity) if capabilities.authenticated => println!("   ✅ Logged in as {}", identity),
        _ if capabilities.authenticated => println!("   ✅ Logged in"),
        _ => println!("   ❌ Not logged in (run `wrangler login`)"),
    }
    println!("   D1: {}", if capabilities.can_use_d1 { "✅" } else { "❌" });
    println!("   R2: {}", if capabilities.can_use_r2 { "✅" } else { "❌" });
    println!();

    println!("🏗️  Plan");
    println!("{}", plan.describe());
    Ok(())
}
