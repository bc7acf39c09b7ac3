//! Error types for deployment verification.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for verification operations.
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Errors that can occur during verification.
///
/// Failed probes and failed external checks are not errors; they are
/// recorded in the report.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Invalid base URL '{0}': expected an absolute http(s) URL")]
    InvalidBaseUrl(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Failed to write artifact {path:?}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
