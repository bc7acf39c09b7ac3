//! Error types for environment resolution.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for environment operations.
pub type EnvResult<T> = Result<T, EnvError>;

/// Errors that can occur while resolving the environment.
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("Environment validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Failed to parse env content: {0}")]
    Parse(#[from] dotenvy::Error),
}

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub key: String,
    pub problem: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    InvalidUrl(String),
    InvalidIdentifier(String),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            IssueKind::Missing => write!(f, "{} is required", self.key),
            IssueKind::InvalidUrl(value) => {
                write!(f, "{} must be an absolute http(s) URL (got {:?})", self.key, value)
            }
            IssueKind::InvalidIdentifier(pattern) => {
                write!(f, "{} must match {}", self.key, pattern)
            }
        }
    }
}

/// Every violation found in one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub Vec<ValidationIssue>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, key: &str, problem: IssueKind) {
        self.0.push(ValidationIssue {
            key: key.to_string(),
            problem,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.0.iter()
    }

    /// Check whether a key has at least one reported issue.
    pub fn mentions(&self, key: &str) -> bool {
        self.0.iter().any(|issue| issue.key == key)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} problem(s)", self.0.len())?;
        for issue in &self.0 {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}
