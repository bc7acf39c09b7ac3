//! Managed resource kinds.

use serde::{Deserialize, Serialize};

use launch_env::keys;
use launch_provider::ToolInvocation;

/// The two storage resource kinds that are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// D1 managed database.
    Database,
    /// R2 object bucket.
    Bucket,
}

impl ResourceKind {
    pub fn all() -> [Self; 2] {
        [ResourceKind::Database, ResourceKind::Bucket]
    }

    /// Plan step id.
    pub fn step_id(&self) -> &'static str {
        match self {
            ResourceKind::Database => "d1",
            ResourceKind::Bucket => "r2",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ResourceKind::Database => "D1 database",
            ResourceKind::Bucket => "R2 bucket",
        }
    }

    /// Naming suffix appended to the project name.
    pub fn name_suffix(&self) -> &'static str {
        match self {
            ResourceKind::Database => "-db",
            ResourceKind::Bucket => "-assets",
        }
    }

    /// Deterministic resource name for a project.
    pub fn resource_name(&self, project: &str) -> String {
        format!("{}{}", project, self.name_suffix())
    }

    /// Whether a confirmed resource must carry a provider id.
    pub fn requires_id(&self) -> bool {
        matches!(self, ResourceKind::Database)
    }

    /// Generated keys this kind fills in.
    pub fn generated_keys(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Database => &[keys::D1_DATABASE_NAME, keys::D1_DATABASE_ID],
            ResourceKind::Bucket => &[keys::R2_BUCKET_NAME],
        }
    }

    pub fn list_invocation(&self) -> ToolInvocation {
        match self {
            ResourceKind::Database => ToolInvocation::new(["d1", "list", "--json"]),
            ResourceKind::Bucket => ToolInvocation::new(["r2", "bucket", "list"]),
        }
    }

    pub fn describe_invocation(&self, name: &str) -> ToolInvocation {
        match self {
            ResourceKind::Database => ToolInvocation::new(["d1", "info", name, "--json"]),
            ResourceKind::Bucket => ToolInvocation::new(["r2", "bucket", "info", name]),
        }
    }

    pub fn create_invocation(&self, name: &str) -> ToolInvocation {
        let invocation = match self {
            ResourceKind::Database => ToolInvocation::new(["d1", "create", name]),
            ResourceKind::Bucket => ToolInvocation::new(["r2", "bucket", "create", name]),
        };
        invocation.mutating()
    }

    /// HTTP API listing path.
    pub fn api_path(&self, account_id: &str) -> String {
        match self {
            ResourceKind::Database => format!("/accounts/{}/d1/database", account_id),
            ResourceKind::Bucket => format!("/accounts/{}/r2/buckets", account_id),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A resource as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RemoteResource {
    pub fn new(name: impl Into<String>, id: Option<String>) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    /// Whether this entry is complete enough to bind to.
    pub fn is_usable(&self, kind: ResourceKind) -> bool {
        !self.name.is_empty() && (!kind.requires_id() || self.id.is_some())
    }
}
