//! Smoke command - Verify a live deployment.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info, warn};

use launch_env::keys;
use launch_verify::{
    ReportWriter, ReqwestClient, Verifier, VerifyMode, VerifyOptions, DEFAULT_ROUTES,
};

use super::Workspace;

#[derive(Args)]
pub struct SmokeArgs {
    /// Deployment base URL (defaults to WORKER_ORIGIN)
    #[arg(long, env = "LAUNCH_BASE_URL")]
    base: Option<String>,

    /// full runs database and secret checks; minimal only probes HTTP
    #[arg(long, default_value = "full")]
    mode: VerifyMode,

    /// Bearer token for the authenticated session probe
    #[arg(long, env = "LAUNCH_SMOKE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Comma-separated page routes
    #[arg(long, value_delimiter = ',')]
    routes: Vec<String>,

    /// Skip wrangler-backed checks (only with --mode minimal; full mode needs them)
    #[arg(long)]
    skip_wrangler: bool,

    /// Attempts per probe
    #[arg(long, default_value_t = 3)]
    attempts: u32,

    /// Base delay between attempts in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,

    /// Accepted for compatibility; no browser is launched
    #[arg(long)]
    no_headless: bool,
}

pub async fn execute(workspace: &Workspace, args: SmokeArgs) -> Result<()> {
    if args.mode == VerifyMode::Full && args.skip_wrangler {
        anyhow::bail!(
            "--skip-wrangler cannot pass in full mode: database and secret checks would be skipped. Use --mode minimal"
        );
    }

    // An explicit base URL lets minimal runs work without a complete .env
    let config = match (workspace.resolve(), &args.base) {
        (Ok(config), _) => Some(config),
        (Err(e), Some(_)) => {
            warn!("Continuing without project configuration: {:#}", e);
            None
        }
        (Err(e), None) => return Err(e),
    };

    let base = match (&args.base, &config) {
        (Some(base), _) => base.clone(),
        (None, Some(config)) => config.value(keys::WORKER_ORIGIN).to_string(),
        (None, None) => anyhow::bail!("No base URL: pass --base or set PROJECT_DOMAIN"),
    };

    let routes: Vec<String> = if args.routes.is_empty() {
        DEFAULT_ROUTES.iter().map(|r| r.to_string()).collect()
    } else {
        args.routes.clone()
    };

    let options = VerifyOptions {
        mode: args.mode,
        token: args.token.clone(),
        skip_provider: args.skip_wrangler,
        database: config
            .as_ref()
            .and_then(|c| c.non_empty(keys::D1_DATABASE_NAME))
            .map(str::to_string),
        ..VerifyOptions::default()
    }
    .with_retry(args.attempts, Duration::from_millis(args.delay_ms));

    let http = ReqwestClient::new(Duration::from_secs(args.timeout_secs))
        .context("Failed to build HTTP client")?;
    let mut verifier = Verifier::new(Arc::new(http));
    if args.mode == VerifyMode::Full {
        verifier = verifier.with_provider(workspace.provider(config.as_ref())?);
    }

    if args.no_headless {
        debug!("--no-headless has no effect: screenshots are not captured");
    }

    info!("Smoke testing {}", base);
    let report = verifier
        .verify(&base, routes.as_slice(), &options)
        .await
        .context("Verification could not run")?;

    let dir = ReportWriter::artifact_dir(&workspace.dir, &report.generated_at);
    ReportWriter::write(&dir, &report).context("Failed to write smoke artifacts")?;

    println!("🔎 Smoke checks against {}", report.base_url);
    for check in &report.checks {
        let status = check
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "---".to_string());
        println!(
            "   {} {:<24} {} (expected {})",
            if check.passed { "✅" } else { "❌" },
            check.name,
            status,
            check.expected
        );
    }
    for (name, check) in [
        ("database", &report.external_checks.database),
        ("secrets", &report.external_checks.secrets),
    ] {
        println!("   [{:<4}] {}: {}", check.status, name, check.message);
    }
    println!("📁 Report: {}", dir.display());

    if !report.ok {
        anyhow::bail!("Smoke checks failed");
    }
    println!("✅ All smoke checks passed");
    Ok(())
}
