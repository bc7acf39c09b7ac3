//! # launch_verify
//!
//! Post-deploy verification for launchkit: retrying HTTP probes against the
//! live Worker, provider-side database and secret checks, and JSON/Markdown
//! reports.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use launch_verify::{ReportWriter, ReqwestClient, Verifier, VerifyOptions, DEFAULT_HTTP_TIMEOUT, DEFAULT_ROUTES};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let http = Arc::new(ReqwestClient::new(DEFAULT_HTTP_TIMEOUT)?);
//! let report = Verifier::new(http)
//!     .verify("https://shop.example.com", DEFAULT_ROUTES, &VerifyOptions::minimal())
//!     .await?;
//! let dir = ReportWriter::artifact_dir(std::path::Path::new("."), &report.generated_at);
//! ReportWriter::write(&dir, &report)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod external;
pub mod http;
pub mod plan;
pub mod probe;
pub mod report;
pub mod verifier;

pub use error::{VerifyError, VerifyResult};
pub use external::{CheckStatus, ExternalCheck, ExternalChecks};
pub use http::{HttpClient, HttpResponse, ProbeRequest, ReqwestClient, DEFAULT_HTTP_TIMEOUT};
pub use plan::{ExpectedClass, ProbePlan, ProbeSpec, DEFAULT_ROUTES};
pub use probe::{ProbeResult, RetryPolicy};
pub use report::{ReportWriter, VerificationReport, VerifyMode};
pub use verifier::{Verifier, VerifyOptions};
