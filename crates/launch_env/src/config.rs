//! Resolved configuration and its layers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parser::render_env_file;
use crate::redact::RedactedReport;
use crate::schema::{self, keys, LayerKind};

/// A candidate configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSource {
    pub path: PathBuf,
    pub exists: bool,
    pub category: LayerKind,
}

/// One layer of key/value pairs, ordered by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvLayer {
    pub kind: LayerKind,
    values: BTreeMap<String, String>,
}

impl EnvLayer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    /// Value if present and non-empty.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Base and generated layers with a routing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LayerSet {
    pub base: EnvLayer,
    pub generated: EnvLayer,
}

impl LayerSet {
    pub fn new() -> Self {
        Self {
            base: EnvLayer::new(LayerKind::Base),
            generated: EnvLayer::new(LayerKind::Generated),
        }
    }

    /// Insert a value. Classified keys go to their table layer, unknown keys
    /// to `fallback`. A key only ever lives in one layer.
    pub fn insert(&mut self, key: &str, value: &str, fallback: LayerKind) {
        let layer = schema::layer_of(key).unwrap_or(fallback);
        let (target, other) = match layer {
            LayerKind::Base => (&mut self.base, &mut self.generated),
            LayerKind::Generated => (&mut self.generated, &mut self.base),
        };
        if other.remove(key).is_some() {
            debug!("Moved {} into the {} layer", key, layer);
        }
        target.set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.generated.get(key).or_else(|| self.base.get(key))
    }

    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }
}

/// The validated union of the base and generated layers.
///
/// Built once by [`crate::EnvResolver`]. The only way to change it afterwards
/// is [`ResolvedConfig::merge_generated`], which returns a new value.
///
/// `persisted` holds what `.env.generated` contained at load time plus values
/// merged later. Local overrides and process environment values are resolved
/// into `generated` but never reach `persisted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub base: EnvLayer,
    pub generated: EnvLayer,
    pub persisted: EnvLayer,
    pub sources: Vec<EnvSource>,
    pub missing_generated: Vec<String>,
}

impl ResolvedConfig {
    pub(crate) fn from_layers(
        layers: LayerSet,
        persisted: EnvLayer,
        sources: Vec<EnvSource>,
    ) -> Self {
        let mut config = Self {
            base: layers.base,
            generated: layers.generated,
            persisted,
            sources,
            missing_generated: Vec::new(),
        };
        config.missing_generated = config.compute_missing_generated();
        config
    }

    /// Look up a value in either layer.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.generated.get(key).or_else(|| self.base.get(key))
    }

    /// Value or empty string.
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Value if present and non-empty.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn project_name(&self) -> &str {
        self.value(keys::PROJECT_NAME)
    }

    pub fn account_id(&self) -> &str {
        self.value(keys::CLOUDFLARE_ACCOUNT_ID)
    }

    pub fn api_token(&self) -> Option<&str> {
        self.non_empty(keys::CLOUDFLARE_API_TOKEN)
    }

    /// All resolved pairs across both layers, ordered by key.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut all: BTreeMap<&str, &str> = self.base.iter().collect();
        all.extend(self.generated.iter());
        all.into_iter().collect()
    }

    fn compute_missing_generated(&self) -> Vec<String> {
        schema::keys_in(LayerKind::Generated)
            .filter(|spec| self.generated.non_empty(spec.name).is_none())
            .map(|spec| spec.name.to_string())
            .collect()
    }

    /// Merge values produced after load time (reconciliation output, fresh
    /// secrets) and recompute which generated keys are still missing.
    pub fn merge_generated(&self, updates: &BTreeMap<String, String>) -> ResolvedConfig {
        let mut layers = LayerSet {
            base: self.base.clone(),
            generated: self.generated.clone(),
        };
        let mut persisted = self.persisted.clone();
        for (key, value) in updates {
            layers.insert(key, value, LayerKind::Generated);
            persisted.set(key.as_str(), value.as_str());
        }
        debug!("Merged {} late generated value(s)", updates.len());
        Self::from_layers(layers, persisted, self.sources.clone())
    }

    /// Display-safe report of every resolved value.
    pub fn redacted_report(&self) -> RedactedReport {
        RedactedReport::build(&self.sources, self.entries(), &self.missing_generated)
    }

    /// Contents of the generated environment file: its loaded values plus
    /// anything merged since.
    pub fn generated_env_file(&self) -> String {
        render_env_file(
            "Generated by launchkit. Do not edit by hand.",
            self.persisted.iter(),
        )
    }

    /// Contents of the secrets file consumed by the deployed Worker.
    pub fn secrets_file(&self) -> String {
        let entries: Vec<(&str, &str)> = schema::worker_secrets()
            .filter_map(|spec| self.non_empty(spec.name).map(|value| (spec.name, value)))
            .collect();
        render_env_file(
            "Worker secrets generated by launchkit. Do not commit.",
            entries,
        )
    }
}
