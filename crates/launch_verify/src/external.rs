//! Checks against provider state that HTTP probes cannot see.

use launch_provider::{CommandOutput, ProviderClient, ToolInvocation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Query run against the database when none is configured.
pub const DEFAULT_DATABASE_QUERY: &str =
    "SELECT name FROM sqlite_master WHERE type='table' AND name='users'";

/// Secrets the deployed Worker cannot start without.
pub const REQUIRED_SECRETS: &[&str] = &["AUTH_CLIENT_SECRET", "STRIPE_SECRET_KEY", "SESSION_SECRET"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Skip,
    Fail,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "ok",
            CheckStatus::Skip => "skip",
            CheckStatus::Fail => "fail",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCheck {
    pub status: CheckStatus,
    pub message: String,
}

impl ExternalCheck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Ok,
            message: message.into(),
        }
    }

    pub fn skip(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Skip,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == CheckStatus::Ok
    }
}

/// Database and secrets checks for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalChecks {
    pub database: ExternalCheck,
    pub secrets: ExternalCheck,
}

impl ExternalChecks {
    pub fn skipped(reason: &str) -> Self {
        Self {
            database: ExternalCheck::skip(reason),
            secrets: ExternalCheck::skip(reason),
        }
    }

    pub fn all_ok(&self) -> bool {
        self.database.is_ok() && self.secrets.is_ok()
    }
}

/// Check that `query` returns at least one row from the remote database.
pub async fn check_database(
    provider: &dyn ProviderClient,
    database: Option<&str>,
    query: &str,
) -> ExternalCheck {
    let Some(database) = database.filter(|d| !d.is_empty()) else {
        return ExternalCheck::skip("D1_DATABASE_NAME is not set");
    };

    let invocation = ToolInvocation::new([
        "d1", "execute", database, "--remote", "--json", "--command", query,
    ]);
    let output = match run_checked(provider, &invocation).await {
        Ok(output) => output,
        Err(message) => return ExternalCheck::fail(message),
    };

    let check = match serde_json::from_str::<Value>(output.stdout.trim()) {
        Ok(json) => {
            let rows = count_rows(&json);
            if rows > 0 {
                ExternalCheck::ok(format!("{} returned {} row(s)", database, rows))
            } else {
                ExternalCheck::fail(format!("{} returned no rows for `{}`", database, query))
            }
        }
        Err(e) => ExternalCheck::fail(format!("unreadable d1 output: {}", e)),
    };
    log_check("database", &check);
    check
}

/// Check that every required secret is configured on the Worker.
pub async fn check_secrets(provider: &dyn ProviderClient, required: &[&str]) -> ExternalCheck {
    let invocation = ToolInvocation::new(["secret", "list"]);
    let output = match run_checked(provider, &invocation).await {
        Ok(output) => output,
        Err(message) => return ExternalCheck::fail(message),
    };

    let check = match parse_secret_names(&output.stdout) {
        Some(names) => {
            let missing: Vec<&str> = required
                .iter()
                .copied()
                .filter(|r| !names.iter().any(|n| n == r))
                .collect();
            if missing.is_empty() {
                ExternalCheck::ok(format!("{} required secret(s) present", required.len()))
            } else {
                ExternalCheck::fail(format!("missing secret(s): {}", missing.join(", ")))
            }
        }
        None => ExternalCheck::fail("unreadable secret list output"),
    };
    log_check("secrets", &check);
    check
}

async fn run_checked(
    provider: &dyn ProviderClient,
    invocation: &ToolInvocation,
) -> Result<CommandOutput, String> {
    match provider.run(invocation).await {
        Ok(output) if output.is_success() => Ok(output),
        Ok(output) => {
            let detail = output
                .stderr
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("no error output")
                .to_string();
            warn!("`{}` exited with {}: {}", invocation, output.exit_code, detail);
            Err(format!("`{}` failed: {}", invocation, detail))
        }
        Err(e) => {
            warn!("`{}` could not run: {}", invocation, e);
            Err(format!("`{}` could not run: {}", invocation, e))
        }
    }
}

/// Rows in `d1 execute --json` output: `[{"results": [...], "success": true}]`.
fn count_rows(json: &Value) -> usize {
    let batches = match json {
        Value::Array(items) => items.as_slice(),
        other => std::slice::from_ref(other),
    };
    batches
        .iter()
        .filter_map(|batch| batch.get("results").and_then(Value::as_array))
        .map(Vec::len)
        .sum()
}

/// Names from `secret list` output: a JSON array of `{"name": ..}` objects.
pub fn parse_secret_names(stdout: &str) -> Option<Vec<String>> {
    let json: Value = serde_json::from_str(stdout.trim()).ok()?;
    let items = json.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
    )
}

fn log_check(name: &str, check: &ExternalCheck) {
    match check.status {
        CheckStatus::Ok => info!("✓ {}: {}", name, check.message),
        CheckStatus::Skip => info!("- {}: {}", name, check.message),
        CheckStatus::Fail => warn!("✗ {}: {}", name, check.message),
    }
}
