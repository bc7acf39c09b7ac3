//! The endpoint probe plan.

use serde::{Deserialize, Serialize};

/// Page routes probed when none are given.
pub const DEFAULT_ROUTES: &[&str] = &["/", "/app", "/pricing", "/login", "/logout", "/callback"];

/// Last path segments that may legitimately redirect.
pub const REDIRECT_ROUTES: &[&str] = &["login", "logout", "callback"];

pub const SESSION_ROUTE: &str = "/api/session";
pub const DEBUG_ROUTE: &str = "/api/debug/auth";
pub const STATIC_ASSET_ROUTE: &str = "/favicon.ico";

/// Artifact file for the debug route body.
pub const DEBUG_ARTIFACT: &str = "debug-auth.txt";

/// Accepted status class for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedClass {
    /// 200-299
    #[serde(rename = "2xx")]
    Success,
    /// 200-399
    #[serde(rename = "2xx-or-3xx")]
    SuccessOrRedirect,
    /// 200 or 404
    #[serde(rename = "200-or-404")]
    OkOrNotFound,
    #[serde(rename = "401")]
    Unauthorized,
}

impl ExpectedClass {
    pub fn matches(&self, status: u16) -> bool {
        match self {
            ExpectedClass::Success => (200..300).contains(&status),
            ExpectedClass::SuccessOrRedirect => (200..400).contains(&status),
            ExpectedClass::OkOrNotFound => status == 200 || status == 404,
            ExpectedClass::Unauthorized => status == 401,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpectedClass::Success => "2xx",
            ExpectedClass::SuccessOrRedirect => "2xx-or-3xx",
            ExpectedClass::OkOrNotFound => "200-or-404",
            ExpectedClass::Unauthorized => "401",
        }
    }
}

impl std::fmt::Display for ExpectedClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One planned probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeSpec {
    pub name: String,
    pub path: String,
    pub expected: ExpectedClass,
    pub authenticated: bool,
    /// Save the full response body under this artifact name.
    pub capture_as: Option<String>,
}

impl ProbeSpec {
    fn new(name: impl Into<String>, path: impl Into<String>, expected: ExpectedClass) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            expected,
            authenticated: false,
            capture_as: None,
        }
    }
}

/// Ordered list of probes for one verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbePlan {
    pub probes: Vec<ProbeSpec>,
}

impl ProbePlan {
    /// Build the plan from page routes; an authenticated session probe is
    /// added only when a token is available.
    pub fn build<S: AsRef<str>>(routes: &[S], has_token: bool) -> Self {
        let mut probes: Vec<ProbeSpec> = routes
            .iter()
            .map(|route| normalize_route(route.as_ref()))
            .map(|path| {
                let expected = if is_redirect_route(&path) {
                    ExpectedClass::SuccessOrRedirect
                } else {
                    ExpectedClass::Success
                };
                ProbeSpec::new(format!("page {}", path), path, expected)
            })
            .collect();

        probes.push(ProbeSpec::new(
            "session (anonymous)",
            SESSION_ROUTE,
            ExpectedClass::Unauthorized,
        ));
        if has_token {
            let mut spec = ProbeSpec::new(
                "session (authenticated)",
                SESSION_ROUTE,
                ExpectedClass::Success,
            );
            spec.authenticated = true;
            probes.push(spec);
        }

        let mut debug = ProbeSpec::new("auth debug", DEBUG_ROUTE, ExpectedClass::SuccessOrRedirect);
        debug.capture_as = Some(DEBUG_ARTIFACT.to_string());
        probes.push(debug);

        probes.push(ProbeSpec::new(
            "static asset",
            STATIC_ASSET_ROUTE,
            ExpectedClass::OkOrNotFound,
        ));

        Self { probes }
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

fn normalize_route(route: &str) -> String {
    let trimmed = route.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn is_redirect_route(path: &str) -> bool {
    let segment = path
        .split(['?', '#'])
        .next()
        .unwrap_or(path)
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("");
    REDIRECT_ROUTES.contains(&segment)
}
