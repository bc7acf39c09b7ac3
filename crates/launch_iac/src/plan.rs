//! Capabilities and the declarative resource plan.

use serde::{Deserialize, Serialize};

use launch_env::ResolvedConfig;

use crate::resource::ResourceKind;

/// Detected permission boundaries. Read-only once detected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub authenticated: bool,
    pub can_use_d1: bool,
    pub can_use_r2: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl Capabilities {
    /// Everything permitted; handy for tests and trusted environments.
    pub fn full(identity: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            can_use_d1: true,
            can_use_r2: true,
            identity: Some(identity.into()),
        }
    }

    pub fn can_use(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Database => self.can_use_d1,
            ResourceKind::Bucket => self.can_use_r2,
        }
    }
}

/// Status of a plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ensure,
    Skip,
    Noop,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Ensure => "ensure",
            StepStatus::Skip => "skip",
            StepStatus::Noop => "noop",
        };
        f.pad(s)
    }
}

/// One declared unit of reconciliation work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    pub title: String,
    pub detail: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ResourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Intended operations for one invocation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePlan {
    pub steps: Vec<PlanStep>,
    pub notes: Vec<String>,
    pub capabilities: Capabilities,
}

impl ResourcePlan {
    /// Build the plan for a resolved configuration.
    ///
    /// Resource names derive from `PROJECT_NAME`; a step is `skip` when its
    /// capability is absent and `ensure` otherwise. The Worker itself is a
    /// `noop` here because `deploy` publishes it.
    pub fn build(config: &ResolvedConfig, capabilities: &Capabilities) -> Self {
        let project = config.project_name();
        let mut steps = Vec::new();
        let mut notes = Vec::new();

        if !capabilities.authenticated {
            notes.push("wrangler is not authenticated; run `wrangler login` first".to_string());
        }

        for kind in ResourceKind::all() {
            let name = kind.resource_name(project);
            let (status, detail) = if capabilities.can_use(kind) {
                (StepStatus::Ensure, format!("get or create {} `{}`", kind.title(), name))
            } else {
                notes.push(format!(
                    "No {} permission; the {} binding will be omitted",
                    kind.step_id().to_uppercase(),
                    kind.step_id().to_uppercase()
                ));
                (
                    StepStatus::Skip,
                    format!("{} access missing; `{}` not managed", kind.title(), name),
                )
            };
            steps.push(PlanStep {
                id: kind.step_id().to_string(),
                title: format!("Ensure {}", kind.title()),
                detail,
                status,
                kind: Some(kind),
                target: Some(name),
            });
        }

        steps.push(PlanStep {
            id: "worker".to_string(),
            title: format!("Worker `{}`", project),
            detail: "published by `launch deploy`".to_string(),
            status: StepStatus::Noop,
            kind: None,
            target: Some(project.to_string()),
        });

        Self {
            steps,
            notes,
            capabilities: capabilities.clone(),
        }
    }

    pub fn step(&self, id: &str) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Human-readable rendering for terminals.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            out.push_str(&format!(
                "[{:<6}] {:<7} {} ({})\n",
                step.status, step.id, step.title, step.detail
            ));
        }
        for note in &self.notes {
            out.push_str(&format!("note: {}\n", note));
        }
        out
    }
}
