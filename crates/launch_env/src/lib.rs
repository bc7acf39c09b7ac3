//! # launch_env
//!
//! Environment resolution for launchkit.
//!
//! Configuration is assembled from layered `KEY=VALUE` files, the process
//! environment and caller overrides, then completed by derivation rules and
//! validated as a whole.
//!
//! ## Features
//!
//! - Fixed file precedence (`.env` < `.env.local` < `.env.generated` < `.env.generated.local`)
//! - Static key classification into base and generated layers
//! - Derivation of `APP_URL`, `WORKER_ORIGIN` and `AUTH_AUDIENCE` from `PROJECT_DOMAIN`
//! - Aggregate validation errors
//! - Redacted reporting for display
//!
//! ## Example
//!
//! ```rust,no_run
//! use launch_env::EnvResolver;
//! use std::collections::BTreeMap;
//! use std::path::Path;
//!
//! let resolver = EnvResolver::from_process_env();
//! let config = resolver.resolve(Path::new("."), &BTreeMap::new()).unwrap();
//! println!("{}", config.redacted_report().summary);
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod redact;
pub mod resolver;
pub mod schema;

pub use config::{EnvLayer, EnvSource, ResolvedConfig};
pub use error::{EnvError, EnvResult, IssueKind, ValidationErrors, ValidationIssue};
pub use parser::{parse_env, quote_value, read_env_file};
pub use redact::{is_sensitive, redact_value, RedactedReport};
pub use resolver::{EnvResolver, BASE_FILES, GENERATED_FILES, PERSISTED_GENERATED_FILE};
pub use schema::{keys, KeySpec, LayerKind, ValueKind, KEY_TABLE};
