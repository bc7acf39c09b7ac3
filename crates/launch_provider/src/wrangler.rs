//! `wrangler` subprocess client with an HTTP API fallback.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::client::{CommandOutput, ProviderClient, ToolInvocation};
use crate::error::{ProviderError, ProviderResult};

/// Default base URL of the provider HTTP API.
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Options for the `wrangler` client.
#[derive(Debug, Clone)]
pub struct WranglerOptions {
    /// Program to execute.
    pub program: String,
    /// Arguments placed before every invocation (e.g. `["wrangler"]` for `npx`).
    pub prefix_args: Vec<String>,
    /// Working directory for the subprocess.
    pub workdir: Option<PathBuf>,
    /// Extra environment for the subprocess.
    pub env: BTreeMap<String, String>,
    /// Subprocess timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// HTTP API base URL.
    pub api_base: String,
    /// HTTP API request timeout. `None` uses no client-side limit.
    pub api_timeout: Option<Duration>,
}

impl Default for WranglerOptions {
    fn default() -> Self {
        Self {
            program: "wrangler".to_string(),
            prefix_args: Vec::new(),
            workdir: None,
            env: BTreeMap::new(),
            timeout: None,
            api_base: DEFAULT_API_BASE.to_string(),
            api_timeout: None,
        }
    }
}

impl WranglerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run through `npx wrangler` instead of a global install.
    pub fn via_npx(mut self) -> Self {
        self.program = "npx".to_string();
        self.prefix_args = vec!["--yes".to_string(), "wrangler".to_string()];
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn api_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = Some(timeout);
        self
    }
}

/// Provider client that shells out to `wrangler`.
pub struct WranglerCli {
    options: WranglerOptions,
    http: reqwest::Client,
}

impl WranglerCli {
    pub fn new(options: WranglerOptions) -> ProviderResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.api_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { options, http })
    }

    pub fn options(&self) -> &WranglerOptions {
        &self.options
    }

    /// Full argument vector including the prefix.
    fn build_args(&self, invocation: &ToolInvocation) -> Vec<String> {
        self.options
            .prefix_args
            .iter()
            .chain(invocation.args.iter())
            .cloned()
            .collect()
    }

    /// Format command for logging.
    fn format_command(&self, args: &[String]) -> String {
        let mut cmd = self.options.program.clone();
        for arg in args {
            if arg.contains(' ') {
                cmd.push_str(&format!(" '{}'", arg));
            } else {
                cmd.push(' ');
                cmd.push_str(arg);
            }
        }
        cmd
    }
}

#[async_trait]
impl ProviderClient for WranglerCli {
    async fn run(&self, invocation: &ToolInvocation) -> ProviderResult<CommandOutput> {
        let args = self.build_args(invocation);
        let cmd_str = self.format_command(&args);
        if invocation.mutating {
            info!("Running: {}", cmd_str);
        } else {
            debug!("Running: {}", cmd_str);
        }

        let mut cmd = Command::new(&self.options.program);
        cmd.args(&args).envs(&self.options.env).kill_on_drop(true);
        if let Some(dir) = &self.options.workdir {
            cmd.current_dir(dir);
        }

        let output = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| ProviderError::Timeout(cmd_str.clone(), limit.as_secs()))?,
            None => cmd.output().await,
        }
        .map_err(|source| ProviderError::Spawn {
            program: self.options.program.clone(),
            source,
        })?;

        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.is_success() {
            debug!("`{}` exited with {}", cmd_str, result.exit_code);
        }
        Ok(result)
    }

    async fn api_get(&self, path: &str, token: &str) -> ProviderResult<serde_json::Value> {
        let url = format!("{}{}", self.options.api_base.trim_end_matches('/'), path);
        debug!("GET {}", url);

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!("Provider API returned {} for {}", status, path);
            return Err(ProviderError::Api(format!("{} returned {}", path, status)));
        }
        decode_api_body(path, &text)
    }
}

/// Decode an API envelope, turning `"success": false` into an error.
fn decode_api_body(path: &str, text: &str) -> ProviderResult<serde_json::Value> {
    let body: serde_json::Value = serde_json::from_str(text)?;
    if body.get("success").and_then(|s| s.as_bool()) == Some(false) {
        return Err(ProviderError::Api(format!(
            "{} reported errors: {}",
            path,
            body.get("errors").cloned().unwrap_or_default()
        )));
    }
    Ok(body)
}
