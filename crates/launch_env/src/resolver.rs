//! Layered environment resolution.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};
use url::Url;

use crate::config::{EnvLayer, EnvSource, LayerSet, ResolvedConfig};
use crate::error::{EnvError, EnvResult, IssueKind, ValidationErrors};
use crate::parser::read_env_file;
use crate::schema::{self, keys, LayerKind, ValueKind};

/// Hand-authored files, lowest precedence first.
pub const BASE_FILES: &[&str] = &[".env", ".env.local"];

/// The tool-authored file that launchkit rewrites.
pub const PERSISTED_GENERATED_FILE: &str = ".env.generated";

/// Tool-authored files, applied after the base files, lowest precedence first.
/// Only [`PERSISTED_GENERATED_FILE`] is ever written back.
pub const GENERATED_FILES: &[&str] = &[PERSISTED_GENERATED_FILE, ".env.generated.local"];

/// Base path used for `APP_URL` when `APP_BASE_PATH` is unset.
pub const DEFAULT_APP_BASE_PATH: &str = "/app";

/// Suffix appended to the root domain to form the auth audience.
pub const AUDIENCE_SUFFIX: &str = "/api";

/// Resolves a [`ResolvedConfig`] from files, process environment and
/// caller overrides.
#[derive(Debug, Clone, Default)]
pub struct EnvResolver {
    process_env: BTreeMap<String, String>,
}

impl EnvResolver {
    /// Resolver that reads classified keys from the process environment.
    pub fn from_process_env() -> Self {
        let process_env = std::env::vars()
            .filter(|(key, _)| schema::lookup(key).is_some())
            .collect();
        Self { process_env }
    }

    /// Resolver with an explicit process environment.
    pub fn with_process_env(process_env: BTreeMap<String, String>) -> Self {
        Self { process_env }
    }

    /// Resolve and validate the configuration found in `search_dir`.
    pub fn resolve(
        &self,
        search_dir: &Path,
        overrides: &BTreeMap<String, String>,
    ) -> EnvResult<ResolvedConfig> {
        let mut layers = LayerSet::new();
        let mut persisted = EnvLayer::new(LayerKind::Generated);
        let mut sources = Vec::new();

        let candidates = BASE_FILES
            .iter()
            .map(|name| (*name, LayerKind::Base))
            .chain(GENERATED_FILES.iter().map(|name| (*name, LayerKind::Generated)));

        for (name, category) in candidates {
            let path = search_dir.join(name);
            let exists = path.is_file();
            if exists {
                let pairs = read_env_file(&path)?;
                debug!("Loaded {} value(s) from {:?}", pairs.len(), path);
                for (key, value) in &pairs {
                    layers.insert(key, value, category);
                    if name == PERSISTED_GENERATED_FILE {
                        persisted.set(key.as_str(), value.as_str());
                    }
                }
            }
            sources.push(EnvSource {
                path,
                exists,
                category,
            });
        }

        apply_derivations(&mut layers);

        for (key, value) in &self.process_env {
            layers.insert(key, value, LayerKind::Base);
        }
        for (key, value) in overrides {
            layers.insert(key, value, LayerKind::Generated);
        }

        // Roots that only arrived through the environment or overrides
        apply_derivations(&mut layers);

        let errors = validate(&layers);
        if !errors.is_empty() {
            return Err(EnvError::Validation(errors));
        }

        let config = ResolvedConfig::from_layers(layers, persisted, sources);
        info!(
            "Resolved {} base and {} generated value(s)",
            config.base.len(),
            config.generated.len()
        );
        if !config.missing_generated.is_empty() {
            info!(
                "Generated values not provisioned yet: {}",
                config.missing_generated.join(", ")
            );
        }
        Ok(config)
    }
}

/// Strip trailing slashes from a root URL.
pub fn strip_trailing_slash(value: &str) -> &str {
    value.trim_end_matches('/')
}

/// Ensure a base path starts with `/` and has no trailing `/`.
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Fill unset keys from other values, in a fixed order.
fn apply_derivations(layers: &mut LayerSet) {
    let unset = |layers: &LayerSet, key: &str| layers.non_empty(key).is_none();

    if unset(layers, keys::STRIPE_SECRET_KEY) {
        if let Some(test_key) = layers.non_empty(keys::STRIPE_TEST_SECRET_KEY).map(str::to_string) {
            debug!("Using STRIPE_TEST_SECRET_KEY as STRIPE_SECRET_KEY");
            layers.insert(keys::STRIPE_SECRET_KEY, &test_key, LayerKind::Base);
        }
    }

    let Some(root) = layers
        .non_empty(keys::PROJECT_DOMAIN)
        .map(|d| strip_trailing_slash(d).to_string())
    else {
        return;
    };

    if unset(layers, keys::AUTH_AUDIENCE) {
        layers.insert(
            keys::AUTH_AUDIENCE,
            &format!("{}{}", root, AUDIENCE_SUFFIX),
            LayerKind::Base,
        );
    }

    if unset(layers, keys::APP_URL) {
        let base_path = layers
            .non_empty(keys::APP_BASE_PATH)
            .unwrap_or(DEFAULT_APP_BASE_PATH);
        let app_url = format!("{}{}", root, normalize_base_path(base_path));
        layers.insert(keys::APP_URL, &app_url, LayerKind::Base);
    }

    if unset(layers, keys::WORKER_ORIGIN) {
        layers.insert(keys::WORKER_ORIGIN, &root, LayerKind::Base);
    }
}

fn is_http_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Check every classified key and collect all violations.
fn validate(layers: &LayerSet) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    for spec in schema::KEY_TABLE {
        let layer = match spec.layer {
            LayerKind::Base => &layers.base,
            LayerKind::Generated => &layers.generated,
        };
        let Some(value) = layer.non_empty(spec.name) else {
            if spec.required {
                errors.push(spec.name, IssueKind::Missing);
            }
            continue;
        };

        match spec.kind {
            ValueKind::Text => {}
            ValueKind::Url => {
                if !is_http_url(value) {
                    errors.push(spec.name, IssueKind::InvalidUrl(value.to_string()));
                }
            }
            ValueKind::Slug | ValueKind::AlphaNum | ValueKind::ResourceId => {
                if let (Some(regex), Some(pattern)) = (spec.kind.regex(), spec.kind.pattern()) {
                    if !regex.is_match(value) {
                        errors.push(spec.name, IssueKind::InvalidIdentifier(pattern.to_string()));
                    }
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("app"), "/app");
        assert_eq!(normalize_base_path("/app/"), "/app");
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path("dash/board"), "/dash/board");
    }

    #[test]
    fn test_derivations_only_fill_unset_keys() {
        let mut layers = LayerSet::new();
        layers.insert(keys::PROJECT_DOMAIN, "https://example.com/", LayerKind::Base);
        layers.insert(keys::APP_BASE_PATH, "dashboard/", LayerKind::Base);
        layers.insert(keys::WORKER_ORIGIN, "https://api.example.com", LayerKind::Base);
        layers.insert(keys::STRIPE_TEST_SECRET_KEY, "sk_test_x", LayerKind::Base);

        apply_derivations(&mut layers);

        assert_eq!(layers.get(keys::APP_URL), Some("https://example.com/dashboard"));
        assert_eq!(layers.get(keys::AUTH_AUDIENCE), Some("https://example.com/api"));
        assert_eq!(layers.get(keys::WORKER_ORIGIN), Some("https://api.example.com"));
        assert_eq!(layers.get(keys::STRIPE_SECRET_KEY), Some("sk_test_x"));
    }

    #[test]
    fn test_secret_fallback_does_not_replace_primary() {
        let mut layers = LayerSet::new();
        layers.insert(keys::STRIPE_SECRET_KEY, "sk_live_x", LayerKind::Base);
        layers.insert(keys::STRIPE_TEST_SECRET_KEY, "sk_test_x", LayerKind::Base);
        apply_derivations(&mut layers);
        assert_eq!(layers.get(keys::STRIPE_SECRET_KEY), Some("sk_live_x"));
    }

    #[test]
    fn test_url_check() {
        assert!(is_http_url("https://example.com"));
        assert!(is_http_url("http://localhost:8787/app"));
        assert!(!is_http_url("example.com"));
        assert!(!is_http_url("ftp://example.com"));
    }
}
