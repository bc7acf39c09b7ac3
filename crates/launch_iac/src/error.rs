//! Error types for reconciliation.

use thiserror::Error;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur during reconciliation.
///
/// Missing permissions are not errors: they degrade to skipped plan steps.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("Reconciliation failed for {resource}: {reason}")]
    Reconciliation { resource: String, reason: String },

    #[error("Deploy failed: {0}")]
    DeployFailed(String),

    #[error("Provider error: {0}")]
    Provider(#[from] launch_provider::ProviderError),
}
