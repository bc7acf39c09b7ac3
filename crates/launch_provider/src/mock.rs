//! Mock provider client for testing.
//!
//! Responses are registered against argument prefixes and API paths; every
//! call is captured so tests can assert which commands were issued.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::client::{CommandOutput, ProviderClient, ToolInvocation};
use crate::error::{ProviderError, ProviderResult};

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    /// Joined tool arguments, or `api <path>` for HTTP API calls.
    pub command: String,
    pub mutating: bool,
}

/// Mock provider client.
///
/// A registered prefix answers every invocation whose joined arguments start
/// with it; the longest matching prefix wins. Queued responses are consumed
/// in order and the last one repeats. Unmatched invocations exit with 127.
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<RwLock<Vec<(String, VecDeque<CommandOutput>)>>>,
    api_responses: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for invocations starting with `prefix`.
    pub fn on(self, prefix: impl Into<String>, output: CommandOutput) -> Self {
        let prefix = prefix.into();
        {
            let mut responses = self.responses.write();
            match responses.iter_mut().find(|(p, _)| *p == prefix) {
                Some((_, queue)) => queue.push_back(output),
                None => responses.push((prefix, VecDeque::from([output]))),
            }
        }
        self
    }

    /// Register a JSON body for an API path.
    pub fn on_api(self, path: impl Into<String>, body: serde_json::Value) -> Self {
        self.api_responses.write().insert(path.into(), body);
        self
    }

    /// Get all captured calls.
    pub fn calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Number of calls whose command starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.command.starts_with(prefix))
            .count()
    }

    /// Check if a command starting with `prefix` was issued.
    pub fn was_called(&self, prefix: &str) -> bool {
        self.count(prefix) > 0
    }

    /// Whether any mutating call was issued.
    pub fn any_mutating(&self) -> bool {
        self.captured_calls.read().iter().any(|c| c.mutating)
    }

    fn record_call(&self, command: String, mutating: bool) {
        self.captured_calls
            .write()
            .push(CapturedCall { command, mutating });
    }

    fn next_response(&self, joined: &str) -> Option<CommandOutput> {
        let mut responses = self.responses.write();
        let (_, queue) = responses
            .iter_mut()
            .filter(|(prefix, _)| joined.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    async fn run(&self, invocation: &ToolInvocation) -> ProviderResult<CommandOutput> {
        let joined = invocation.joined();
        self.record_call(joined.clone(), invocation.mutating);
        Ok(self
            .next_response(&joined)
            .unwrap_or_else(|| CommandOutput::failure(127, format!("no mock response for `{}`", joined))))
    }

    async fn api_get(&self, path: &str, _token: &str) -> ProviderResult<serde_json::Value> {
        self.record_call(format!("api {}", path), false);
        self.api_responses
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| ProviderError::Api(format!("no mock response for {}", path)))
    }
}
