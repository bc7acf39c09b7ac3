//! Env command - Write generated environment files.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use tracing::info;

use launch_templates::generated;

use super::workspace::with_session_secret;
use super::Workspace;

#[derive(Args)]
pub struct GenerateArgs {
    /// Fail if the files on disk differ instead of writing them
    #[arg(long)]
    check: bool,
}

pub async fn generate(workspace: &Workspace, args: GenerateArgs) -> Result<()> {
    info!("Generating environment files in {}", workspace.dir.display());

    let mut config = workspace.resolve()?;
    if !args.check {
        let mut updates = BTreeMap::new();
        with_session_secret(&config, &mut updates);
        if !updates.is_empty() {
            config = config.merge_generated(&updates);
        }
    }

    println!("📄 Environment files");
    workspace.write(&generated::env_files(&config), args.check)?;

    if !config.missing_generated.is_empty() {
        println!(
            "   ⚠️  Not provisioned yet: {} (run `launch apply`)",
            config.missing_generated.join(", ")
        );
    }
    Ok(())
}
