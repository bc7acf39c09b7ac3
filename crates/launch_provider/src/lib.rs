//! # launch_provider
//!
//! Provider access for launchkit.
//!
//! Every interaction with the hosting provider goes through the
//! [`ProviderClient`] trait: subprocess calls to its command-line tool and,
//! as a last resort, GET requests against its HTTP API.
//!
//! # Features
//!
//! - **WranglerCli**: `wrangler` subprocess runner (global install or `npx`)
//! - **Failure policy**: per-call `ignore_failure` turns errors into empty output
//! - **HTTP API**: bearer-authenticated GET via `reqwest`
//! - **MockProvider**: canned responses and call capture for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use launch_provider::{ProviderClient, ToolInvocation, WranglerCli, WranglerOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WranglerCli::new(WranglerOptions::new())?;
//!     let out = client
//!         .call(&ToolInvocation::new(["whoami"]).ignore_failure())
//!         .await?;
//!     println!("{}", out.stdout);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod mock;
pub mod wrangler;

pub use client::{CommandOutput, ProviderClient, ToolInvocation};
pub use error::{ProviderError, ProviderResult};
pub use mock::{CapturedCall, MockProvider};
pub use wrangler::{WranglerCli, WranglerOptions, DEFAULT_API_BASE};
