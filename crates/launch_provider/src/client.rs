//! Provider client trait and invocation types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// One invocation of the provider command-line tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Arguments after the program name, e.g. `["d1", "list", "--json"]`.
    pub args: Vec<String>,
    /// Turn a failing call into an empty output instead of an error.
    pub ignore_failure: bool,
    /// Whether the call changes remote state.
    pub mutating: bool,
}

impl ToolInvocation {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ignore_failure: false,
            mutating: false,
        }
    }

    pub fn ignore_failure(mut self) -> Self {
        self.ignore_failure = true;
        self
    }

    pub fn mutating(mut self) -> Self {
        self.mutating = true;
        self
    }

    /// Space-joined arguments, used for logging and mock matching.
    pub fn joined(&self) -> String {
        self.args.join(" ")
    }
}

impl std::fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.joined())
    }
}

/// Captured output of a tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Output used when an ignorable call fails.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Trimmed stdout, `None` when there is nothing to read.
    pub fn stdout_text(&self) -> Option<&str> {
        let text = self.stdout.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// Access to the provider's command-line tool and HTTP API.
///
/// Production code uses [`crate::WranglerCli`]; tests use
/// [`crate::MockProvider`].
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Run the tool and return its raw output, whatever the exit code.
    async fn run(&self, invocation: &ToolInvocation) -> ProviderResult<CommandOutput>;

    /// GET a path on the provider HTTP API with a bearer token.
    async fn api_get(&self, path: &str, token: &str) -> ProviderResult<serde_json::Value>;

    /// Run the tool, applying the invocation's failure policy.
    ///
    /// A non-zero exit is an error unless the invocation ignores failures,
    /// in which case an empty output is returned.
    async fn call(&self, invocation: &ToolInvocation) -> ProviderResult<CommandOutput> {
        match self.run(invocation).await {
            Ok(output) if output.is_success() => Ok(output),
            Ok(output) if invocation.ignore_failure => {
                debug!(
                    "Ignoring failure of `{}` (exit {})",
                    invocation, output.exit_code
                );
                Ok(CommandOutput::empty())
            }
            Ok(output) => Err(ProviderError::CommandFailed {
                command: invocation.joined(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            }),
            Err(e) if invocation.ignore_failure => {
                debug!("Ignoring error from `{}`: {}", invocation, e);
                Ok(CommandOutput::empty())
            }
            Err(e) => Err(e),
        }
    }
}
