//! # launch_templates
//!
//! Deployment configuration rendering and idempotent file generation.
//!
//! ## Features
//!
//! - Strict `{{NAME}}` placeholders: unknown names fail the render
//! - TOML-safe escaping of substituted values
//! - Conditional `{{D1_BINDING}}` / `{{R2_BINDING}}` sections
//! - Byte-for-byte idempotent writes with a check-only drift mode
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use launch_templates::{generated, FileWriter, WriteMode};
//! # fn run(config: launch_env::ResolvedConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let dir = Path::new(".");
//! let mut files = generated::env_files(&config);
//! files.push(generated::wrangler_file(dir, &config, None)?);
//! FileWriter::write_all(dir, &files, WriteMode::check())?.ensure_no_drift()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generated;
pub mod renderer;
pub mod writer;

pub use error::{TemplateError, TemplateResult};
pub use renderer::{escape_toml, ConfigRenderer, RenderContext, DEFAULT_WRANGLER_TEMPLATE};
pub use writer::{FileWriter, GeneratedFile, WriteMode, WriteOutcome, WriteSummary};
