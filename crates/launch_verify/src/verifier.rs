//! Verification run orchestration.

use std::sync::Arc;
use std::time::Duration;

use launch_provider::ProviderClient;
use tracing::{info, warn};
use url::Url;

use crate::error::{VerifyError, VerifyResult};
use crate::external::{self, ExternalChecks, DEFAULT_DATABASE_QUERY, REQUIRED_SECRETS};
use crate::http::HttpClient;
use crate::plan::ProbePlan;
use crate::probe::{run_probe, RetryPolicy};
use crate::report::{VerificationReport, VerifyMode};

/// Options for one verification run.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub mode: VerifyMode,
    /// Bearer token for the authenticated session probe.
    pub token: Option<String>,
    pub retry: RetryPolicy,
    /// Skip provider-backed checks even in full mode.
    pub skip_provider: bool,
    pub database: Option<String>,
    pub database_query: String,
    pub required_secrets: Vec<String>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            mode: VerifyMode::Full,
            token: None,
            retry: RetryPolicy::default(),
            skip_provider: false,
            database: None,
            database_query: DEFAULT_DATABASE_QUERY.to_string(),
            required_secrets: REQUIRED_SECRETS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl VerifyOptions {
    pub fn minimal() -> Self {
        Self {
            mode: VerifyMode::Minimal,
            ..Self::default()
        }
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry = RetryPolicy { attempts, delay };
        self
    }
}

/// Runs probes and external checks against a deployment.
pub struct Verifier {
    http: Arc<dyn HttpClient>,
    provider: Option<Arc<dyn ProviderClient>>,
}

impl Verifier {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn ProviderClient>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Verify the deployment at `base_url`.
    ///
    /// Probes run sequentially in plan order. The returned report carries
    /// the aggregate `ok`; a failing deployment is not an `Err`.
    pub async fn verify<S: AsRef<str>>(
        &self,
        base_url: &str,
        routes: &[S],
        options: &VerifyOptions,
    ) -> VerifyResult<VerificationReport> {
        let base = parse_base_url(base_url)?;
        let token = options.token.as_deref().filter(|t| !t.is_empty());
        let plan = ProbePlan::build(routes, token.is_some());

        info!("Verifying {} ({} mode, {} probe(s))", base, options.mode, plan.len());

        let mut checks = Vec::with_capacity(plan.len());
        let mut attachments = std::collections::BTreeMap::new();
        for spec in &plan.probes {
            let url = format!("{}{}", base, spec.path);
            let run = run_probe(self.http.as_ref(), spec, &url, token, options.retry).await;
            if let Some((name, body)) = run.captured {
                attachments.insert(name, body);
            }
            checks.push(run.result);
        }

        let external_checks = self.external_checks(options).await;

        let mut report = VerificationReport::new(base, options.mode, checks, external_checks);
        report.attachments = attachments;

        if report.ok {
            info!("Verification passed");
        } else {
            warn!(
                "Verification failed: {} HTTP check(s) failed",
                report.failed_checks().count()
            );
        }
        Ok(report)
    }

    async fn external_checks(&self, options: &VerifyOptions) -> ExternalChecks {
        if options.mode == VerifyMode::Minimal {
            return ExternalChecks::skipped("minimal mode");
        }
        if options.skip_provider {
            return ExternalChecks::skipped("provider checks disabled");
        }
        let Some(provider) = &self.provider else {
            return ExternalChecks::skipped("no provider client configured");
        };

        let required: Vec<&str> = options.required_secrets.iter().map(String::as_str).collect();
        ExternalChecks {
            database: external::check_database(
                provider.as_ref(),
                options.database.as_deref(),
                &options.database_query,
            )
            .await,
            secrets: external::check_secrets(provider.as_ref(), &required).await,
        }
    }
}

/// Validate the base URL and return it without a trailing slash.
fn parse_base_url(base_url: &str) -> VerifyResult<String> {
    let trimmed = base_url.trim();
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            Ok(trimmed.trim_end_matches('/').to_string())
        }
        _ => Err(VerifyError::InvalidBaseUrl(base_url.to_string())),
    }
}
