//! Retrying HTTP probes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::http::{HttpClient, ProbeRequest};
use crate::plan::{ExpectedClass, ProbeSpec};

/// Characters of body kept in a result.
pub const SNIPPET_CHARS: usize = 200;

/// Retry policy for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Base delay; the wait after attempt `n` is `delay * n`.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay * attempt
    }
}

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub name: String,
    pub url: String,
    pub expected: ExpectedClass,
    pub status: Option<u16>,
    pub attempts_used: u32,
    pub body_snippet: Option<String>,
    pub note: Option<String>,
    pub passed: bool,
}

/// A probe result plus the full body for probes that capture it.
#[derive(Debug, Clone)]
pub struct ProbeRun {
    pub result: ProbeResult,
    pub captured: Option<(String, String)>,
}

/// First `SNIPPET_CHARS` characters of a body.
pub fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_CHARS).collect()
}

/// Run one probe against `url`.
///
/// Only transport failures are retried. A response with an unexpected
/// status is a failed check on the attempt that produced it.
pub async fn run_probe(
    http: &dyn HttpClient,
    spec: &ProbeSpec,
    url: &str,
    token: Option<&str>,
    policy: RetryPolicy,
) -> ProbeRun {
    let attempts = policy.attempts.max(1);
    let mut request = ProbeRequest::get(url);
    if spec.authenticated {
        if let Some(token) = token {
            request = request.with_bearer(token);
        }
    }

    let mut last_error = None;
    for attempt in 1..=attempts {
        match http.get(request.clone()).await {
            Ok(response) => {
                let passed = spec.expected.matches(response.status);
                let note = (!passed).then(|| {
                    format!("expected {}, got {}", spec.expected, response.status)
                });
                if passed {
                    info!("✓ {} {} -> {}", spec.name, url, response.status);
                } else {
                    warn!("✗ {} {} -> {} (expected {})", spec.name, url, response.status, spec.expected);
                }

                let captured = spec
                    .capture_as
                    .as_ref()
                    .map(|name| (name.clone(), response.body.clone()));

                return ProbeRun {
                    result: ProbeResult {
                        name: spec.name.clone(),
                        url: url.to_string(),
                        expected: spec.expected,
                        status: Some(response.status),
                        attempts_used: attempt,
                        body_snippet: Some(snippet(&response.body)),
                        note,
                        passed,
                    },
                    captured,
                };
            }
            Err(e) => {
                debug!("Attempt {}/{} for {} failed: {}", attempt, attempts, url, e);
                last_error = Some(e.to_string());
                if attempt < attempts {
                    tokio::time::sleep(policy.backoff(attempt)).await;
                }
            }
        }
    }

    warn!("✗ {} {} unreachable after {} attempt(s)", spec.name, url, attempts);
    ProbeRun {
        result: ProbeResult {
            name: spec.name.clone(),
            url: url.to_string(),
            expected: spec.expected,
            status: None,
            attempts_used: attempts,
            body_snippet: None,
            note: last_error,
            passed: false,
        },
        captured: None,
    }
}
