//! Apply command - Reconcile resources and write generated files.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use launch_iac::{ExecuteOptions, Reconciler, ResourceAction};
use launch_templates::{generated, RenderContext};

use super::workspace::with_session_secret;
use super::Workspace;

#[derive(Args)]
pub struct ApplyArgs {
    /// Look resources up but create nothing and write no files
    #[arg(long)]
    dry_run: bool,

    /// Publish the Worker after applying
    #[arg(long)]
    deploy: bool,
}

pub async fn execute(workspace: &Workspace, args: ApplyArgs) -> Result<()> {
    info!(
        "Applying in {}{}",
        workspace.dir.display(),
        if args.dry_run { " (dry run)" } else { "" }
    );

    let config = workspace.resolve()?;
    let reconciler = Reconciler::new(workspace.provider(Some(&config))?);

    let capabilities = reconciler.detect_capabilities(&config).await;
    let plan = Reconciler::build_plan(&config, &capabilities);
    println!("🏗️  Plan");
    println!("{}", plan.describe());

    let options = ExecuteOptions {
        dry_run: args.dry_run,
    };
    let result = reconciler
        .execute(&plan, &config, options)
        .await
        .context("Resource reconciliation failed")?;

    for outcome in &result.outcomes {
        let (icon, label) = match outcome.action {
            ResourceAction::Reused => ("✅", "reused"),
            ResourceAction::Created => ("✨", "created"),
            ResourceAction::WouldCreate => ("📝", "would create"),
            ResourceAction::Skipped => ("⏭️ ", "skipped"),
            ResourceAction::Unchanged => ("·", "unchanged"),
        };
        let name = outcome
            .resource
            .as_ref()
            .map(|r| format!(" {}", r.name))
            .unwrap_or_default();
        println!("   {} {}: {}{}", icon, outcome.step_id, label, name);
    }

    if args.dry_run {
        println!();
        println!("Dry run: no resources created, no files written.");
        if args.deploy {
            reconciler.deploy(true).await?;
        }
        return Ok(());
    }

    let mut updates = result.updates;
    with_session_secret(&config, &mut updates);
    let config = config.merge_generated(&updates);

    let context = RenderContext::with_capabilities(capabilities);
    let mut files = generated::env_files(&config);
    files.push(
        generated::wrangler_file(&workspace.dir, &config, Some(&context))
            .context("Failed to render wrangler.toml")?,
    );

    println!();
    println!("📄 Generated files");
    workspace.write(&files, false)?;

    if args.deploy {
        let output = reconciler.deploy(false).await?;
        println!("{}", output.stdout.trim_end());
        println!("🚀 Deployed");
    }

    println!();
    println!("✅ Apply complete");
    Ok(())
}
