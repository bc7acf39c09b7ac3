//! Capability detection and get-or-create reconciliation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use launch_env::ResolvedConfig;
use launch_provider::{CommandOutput, ProviderClient, ToolInvocation};

use crate::error::{IacError, IacResult};
use crate::parsers::{
    find_named, parse_api_listing, parse_creation_response, parse_describe_response,
    parse_identity, LISTING_PARSERS,
};
use crate::plan::{Capabilities, PlanStep, ResourcePlan, StepStatus};
use crate::resource::{RemoteResource, ResourceKind};

/// Execution options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Only read; never create.
    pub dry_run: bool,
}

impl ExecuteOptions {
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// What happened to one plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAction {
    Reused,
    Created,
    WouldCreate,
    Skipped,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_id: String,
    pub action: ResourceAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<RemoteResource>,
}

/// Result of executing a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Generated-config values determined by a non-dry-run execution.
    pub updates: BTreeMap<String, String>,
    pub outcomes: Vec<StepOutcome>,
}

impl ApplyResult {
    pub fn outcome(&self, step_id: &str) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| o.step_id == step_id)
    }
}

/// Result of a get-or-create attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetOrCreate {
    Existing(RemoteResource),
    Created(RemoteResource),
    /// Dry-run found nothing; a real run would create it.
    WouldCreate,
}

/// Reconciles declared resources against the provider.
pub struct Reconciler {
    provider: Arc<dyn ProviderClient>,
}

impl Reconciler {
    pub fn new(provider: Arc<dyn ProviderClient>) -> Self {
        Self { provider }
    }

    /// Probe identity and per-kind list permissions.
    ///
    /// Each probe is independent; an error or empty output means the
    /// capability is absent, never a fatal error.
    pub async fn detect_capabilities(&self, _config: &ResolvedConfig) -> Capabilities {
        let whoami = self.probe(ToolInvocation::new(["whoami"])).await;
        let identity = whoami.as_deref().and_then(parse_identity);
        let authenticated = whoami
            .as_deref()
            .map(|text| !text.to_ascii_lowercase().contains("not authenticated"))
            .unwrap_or(false);

        let can_use_d1 = self
            .probe(ResourceKind::Database.list_invocation())
            .await
            .is_some();
        let can_use_r2 = self
            .probe(ResourceKind::Bucket.list_invocation())
            .await
            .is_some();

        let capabilities = Capabilities {
            authenticated,
            can_use_d1,
            can_use_r2,
            identity,
        };
        info!(
            "Capabilities: authenticated={} d1={} r2={} identity={}",
            capabilities.authenticated,
            capabilities.can_use_d1,
            capabilities.can_use_r2,
            capabilities.identity.as_deref().unwrap_or("-")
        );
        capabilities
    }

    /// Trimmed stdout of a failure-tolerant call, `None` when absent.
    async fn probe(&self, invocation: ToolInvocation) -> Option<String> {
        let invocation = invocation.ignore_failure();
        match self.provider.call(&invocation).await {
            Ok(output) => output.stdout_text().map(str::to_string),
            Err(e) => {
                debug!("Probe `{}` failed: {}", invocation, e);
                None
            }
        }
    }

    /// Build the declarative plan.
    pub fn build_plan(config: &ResolvedConfig, capabilities: &Capabilities) -> ResourcePlan {
        ResourcePlan::build(config, capabilities)
    }

    /// Execute a plan. Dry-run performs lookups only.
    pub async fn execute(
        &self,
        plan: &ResourcePlan,
        config: &ResolvedConfig,
        options: ExecuteOptions,
    ) -> IacResult<ApplyResult> {
        let mut result = ApplyResult::default();

        for step in &plan.steps {
            let outcome = self.execute_step(step, config, options, &mut result.updates).await?;
            result.outcomes.push(outcome);
        }

        if options.dry_run {
            result.updates.clear();
        }
        Ok(result)
    }

    async fn execute_step(
        &self,
        step: &PlanStep,
        config: &ResolvedConfig,
        options: ExecuteOptions,
        updates: &mut BTreeMap<String, String>,
    ) -> IacResult<StepOutcome> {
        let outcome = |action, resource| StepOutcome {
            step_id: step.id.clone(),
            action,
            resource,
        };

        let (Some(kind), Some(name)) = (step.kind, step.target.as_deref()) else {
            debug!("Step {} has nothing to reconcile", step.id);
            return Ok(outcome(ResourceAction::Unchanged, None));
        };

        match step.status {
            StepStatus::Noop => Ok(outcome(ResourceAction::Unchanged, None)),
            StepStatus::Skip => {
                info!("Skipping {} `{}`: {}", kind.title(), name, step.detail);
                for key in kind.generated_keys() {
                    updates.insert(key.to_string(), String::new());
                }
                Ok(outcome(ResourceAction::Skipped, None))
            }
            StepStatus::Ensure => {
                match self.get_or_create(kind, name, config, options.dry_run).await? {
                    GetOrCreate::Existing(resource) => {
                        info!("Reusing {} `{}`", kind.title(), resource.name);
                        record_updates(kind, &resource, updates);
                        Ok(outcome(ResourceAction::Reused, Some(resource)))
                    }
                    GetOrCreate::Created(resource) => {
                        info!("Created {} `{}`", kind.title(), resource.name);
                        record_updates(kind, &resource, updates);
                        Ok(outcome(ResourceAction::Created, Some(resource)))
                    }
                    GetOrCreate::WouldCreate => {
                        info!("[DRY-RUN] Would create {} `{}`", kind.title(), name);
                        Ok(outcome(ResourceAction::WouldCreate, None))
                    }
                }
            }
        }
    }

    /// Look a resource up by name, creating it when absent.
    pub async fn get_or_create(
        &self,
        kind: ResourceKind,
        name: &str,
        config: &ResolvedConfig,
        dry_run: bool,
    ) -> IacResult<GetOrCreate> {
        let listing = self.list_remote(kind, config).await;
        if let Some(existing) = find_named(&listing, name) {
            if existing.is_usable(kind) {
                return Ok(GetOrCreate::Existing(existing));
            }
            debug!("Listing entry for `{}` is incomplete, describing it", name);
            if let Some(described) = self.describe(kind, name).await {
                return Ok(GetOrCreate::Existing(described));
            }
        }

        if dry_run {
            return Ok(GetOrCreate::WouldCreate);
        }

        let created = self.create_and_confirm(kind, name, config).await?;
        Ok(GetOrCreate::Created(created))
    }

    /// Create a resource, then confirm it through the response, a describe
    /// call, and finally a full listing.
    async fn create_and_confirm(
        &self,
        kind: ResourceKind,
        name: &str,
        config: &ResolvedConfig,
    ) -> IacResult<RemoteResource> {
        let create = kind.create_invocation(name);
        let (response, create_error) = match self.provider.call(&create).await {
            Ok(output) => (Some(output), None),
            Err(e) => {
                warn!("`{}` failed: {}; checking whether it exists anyway", create, e);
                (None, Some(e.to_string()))
            }
        };

        if let Some(resource) = response
            .as_ref()
            .and_then(CommandOutput::stdout_text)
            .and_then(|text| parse_creation_response(kind, name, text))
            .filter(|r| r.is_usable(kind))
        {
            debug!("Confirmed `{}` from the create response", name);
            return Ok(resource);
        }

        if let Some(resource) = self.describe(kind, name).await {
            debug!("Confirmed `{}` via describe", name);
            return Ok(resource);
        }

        let listing = self.list_remote(kind, config).await;
        if let Some(resource) = find_named(&listing, name).filter(|r| r.is_usable(kind)) {
            debug!("Confirmed `{}` via listing", name);
            return Ok(resource);
        }

        Err(IacError::Reconciliation {
            resource: format!("{} `{}`", kind.title(), name),
            reason: match create_error {
                Some(e) => format!("create failed ({}) and the resource could not be found", e),
                None => "created but could not be confirmed by response, describe or listing"
                    .to_string(),
            },
        })
    }

    async fn describe(&self, kind: ResourceKind, name: &str) -> Option<RemoteResource> {
        let text = self.probe(kind.describe_invocation(name)).await?;
        parse_describe_response(kind, name, &text)
    }

    /// List resources of a kind: JSON, then table, then the HTTP API.
    ///
    /// An exhausted chain yields an empty list, not an error.
    pub async fn list_remote(&self, kind: ResourceKind, config: &ResolvedConfig) -> Vec<RemoteResource> {
        if let Some(text) = self.probe(kind.list_invocation()).await {
            for (label, parser) in LISTING_PARSERS {
                if let Some(found) = parser(&text) {
                    debug!("Parsed {} {}(s) from {} output", found.len(), kind.step_id(), label);
                    return found;
                }
            }
        }

        let Some(token) = config.api_token() else {
            debug!("No API token; {} listing fallback exhausted", kind.step_id());
            return Vec::new();
        };

        let path = kind.api_path(config.account_id());
        match self.provider.api_get(&path, token).await {
            Ok(body) => match parse_api_listing(&body) {
                Some(found) => {
                    debug!("Parsed {} {}(s) from the HTTP API", found.len(), kind.step_id());
                    found
                }
                None => Vec::new(),
            },
            Err(e) => {
                warn!("{} API listing failed: {}", kind.title(), e);
                Vec::new()
            }
        }
    }

    /// Publish the Worker with `wrangler deploy`.
    pub async fn deploy(&self, dry_run: bool) -> IacResult<CommandOutput> {
        let mut args = vec!["deploy"];
        if dry_run {
            args.push("--dry-run");
        }
        let invocation = ToolInvocation::new(args);
        let invocation = if dry_run { invocation } else { invocation.mutating() };

        info!("Publishing Worker{}", if dry_run { " (dry run)" } else { "" });
        self.provider
            .call(&invocation)
            .await
            .map_err(|e| IacError::DeployFailed(e.to_string()))
    }
}

fn record_updates(kind: ResourceKind, resource: &RemoteResource, updates: &mut BTreeMap<String, String>) {
    match kind {
        ResourceKind::Database => {
            updates.insert(launch_env::keys::D1_DATABASE_NAME.to_string(), resource.name.clone());
            updates.insert(
                launch_env::keys::D1_DATABASE_ID.to_string(),
                resource.id.clone().unwrap_or_default(),
            );
        }
        ResourceKind::Bucket => {
            updates.insert(launch_env::keys::R2_BUCKET_NAME.to_string(), resource.name.clone());
        }
    }
}
