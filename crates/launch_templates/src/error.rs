//! Error types for rendering and file generation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while rendering or writing generated files.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Unknown template placeholder: {{{{{0}}}}}")]
    UnknownPlaceholder(String),

    #[error("Template rendering left an unresolved placeholder: {0}")]
    UnresolvedPlaceholder(String),

    #[error("Generated files are out of date: {}", format_paths(.0))]
    DriftDetected(Vec<PathBuf>),

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
