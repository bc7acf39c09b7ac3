//! HTTP seam used by the probes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::debug;

use crate::error::{VerifyError, VerifyResult};

/// Default request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// A single GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub url: String,
    pub bearer: Option<String>,
}

impl ProbeRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bearer: None,
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Anything that can perform a probe request.
///
/// An `Err` means the request never produced an HTTP status (connection
/// refused, timeout, TLS failure). Any status, including 5xx, is `Ok`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, request: ProbeRequest) -> VerifyResult<HttpResponse>;
}

/// `reqwest` client that never follows redirects.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> VerifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .user_agent(concat!("launchkit/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, request: ProbeRequest) -> VerifyResult<HttpResponse> {
        let mut builder = self.client.get(&request.url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        debug!("GET {} -> {}", request.url, status);
        Ok(HttpResponse { status, body })
    }
}
