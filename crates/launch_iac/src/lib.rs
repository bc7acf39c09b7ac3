//! # launch_iac
//!
//! Resource reconciliation for launchkit.
//!
//! Declared resources (a D1 database and an R2 bucket) are reconciled
//! against the live provider state through a [`launch_provider::ProviderClient`],
//! degrading gracefully when the account lacks permission for a kind.
//!
//! ## Features
//!
//! - Failure-tolerant capability detection
//! - Declarative plan with `ensure` / `skip` / `noop` steps
//! - Idempotent get-or-create with a response → describe → listing confirmation chain
//! - Listing parser chain: JSON → table → HTTP API
//! - Dry-run execution with zero mutating calls
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use launch_iac::{ExecuteOptions, Reconciler};
//! use launch_provider::{WranglerCli, WranglerOptions};
//! # async fn run(config: launch_env::ResolvedConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(WranglerCli::new(WranglerOptions::new())?);
//! let reconciler = Reconciler::new(client);
//!
//! let caps = reconciler.detect_capabilities(&config).await;
//! let plan = Reconciler::build_plan(&config, &caps);
//! let result = reconciler.execute(&plan, &config, ExecuteOptions::dry_run()).await?;
//! println!("{:?}", result.outcomes);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod parsers;
pub mod plan;
pub mod reconciler;
pub mod resource;

pub use error::{IacError, IacResult};
pub use plan::{Capabilities, PlanStep, ResourcePlan, StepStatus};
pub use reconciler::{
    ApplyResult, ExecuteOptions, GetOrCreate, Reconciler, ResourceAction, StepOutcome,
};
pub use resource::{RemoteResource, ResourceKind};
