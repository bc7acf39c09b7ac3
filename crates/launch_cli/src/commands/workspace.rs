//! Shared plumbing for commands operating on a project directory.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;
use uuid::Uuid;

use launch_env::{keys, EnvResolver, ResolvedConfig};
use launch_provider::{ProviderClient, WranglerCli, WranglerOptions};
use launch_templates::{FileWriter, GeneratedFile, WriteMode, WriteSummary};

/// Limit for a single `wrangler` invocation.
const WRANGLER_TIMEOUT: Duration = Duration::from_secs(300);
/// Limit for a single provider HTTP API request.
const API_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Workspace {
    pub dir: PathBuf,
}

impl Workspace {
    pub fn new(dir: Option<PathBuf>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir,
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        if !dir.is_dir() {
            anyhow::bail!("Project directory not found: {}", dir.display());
        }
        Ok(Self { dir })
    }

    /// Resolve and validate the project configuration.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        EnvResolver::from_process_env()
            .resolve(&self.dir, &BTreeMap::new())
            .context("Environment validation failed")
    }

    /// A `wrangler` client running in the project directory.
    pub fn provider(&self, config: Option<&ResolvedConfig>) -> Result<Arc<dyn ProviderClient>> {
        let mut options = WranglerOptions::new()
            .workdir(&self.dir)
            .timeout(WRANGLER_TIMEOUT)
            .api_timeout(API_TIMEOUT);

        if let Some(config) = config {
            if let Some(account) = config.non_empty(keys::CLOUDFLARE_ACCOUNT_ID) {
                options = options.env(keys::CLOUDFLARE_ACCOUNT_ID, account);
            }
            if let Some(token) = config.api_token() {
                options = options.env(keys::CLOUDFLARE_API_TOKEN, token);
            }
        }

        let client = WranglerCli::new(options).context("Failed to set up wrangler client")?;
        Ok(Arc::new(client))
    }

    /// Write generated files, or in check mode fail on any drift.
    pub fn write(&self, files: &[GeneratedFile], check: bool) -> Result<WriteSummary> {
        let mode = if check { WriteMode::check() } else { WriteMode::write() };
        let summary = FileWriter::write_all(&self.dir, files, mode)
            .context("Failed to write generated files")?;

        for outcome in &summary.outcomes {
            let marker = match (outcome.changed, outcome.skipped) {
                (false, _) => "✓ unchanged",
                (true, true) => "✗ out of date",
                (true, false) => "✎ written",
            };
            println!("   {} {}", marker, outcome.path.display());
        }

        if check {
            return summary
                .ensure_no_drift()
                .context("Generated files differ; run without --check to update them");
        }
        Ok(summary)
    }
}

/// Fill `SESSION_SECRET` when the configuration does not have one yet.
pub fn with_session_secret(config: &ResolvedConfig, updates: &mut BTreeMap<String, String>) {
    let present = updates
        .get(keys::SESSION_SECRET)
        .map(|v| !v.is_empty())
        .unwrap_or_else(|| config.non_empty(keys::SESSION_SECRET).is_some());
    if !present {
        debug!("Generating a new SESSION_SECRET");
        updates.insert(keys::SESSION_SECRET.to_string(), new_session_secret());
    }
}

fn new_session_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
