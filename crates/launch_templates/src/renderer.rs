//! Strict placeholder rendering for deployment configuration.

use regex::Regex;
use tracing::debug;

use launch_env::{keys, schema, ResolvedConfig};
use launch_iac::{Capabilities, ResourceKind};

use crate::error::{TemplateError, TemplateResult};

/// The built-in `wrangler.toml` template.
pub const DEFAULT_WRANGLER_TEMPLATE: &str = include_str!("../templates/wrangler.toml.template");

/// Conditional section for the D1 binding.
pub const D1_BINDING: &str = "D1_BINDING";
/// Conditional section for the R2 binding.
pub const R2_BINDING: &str = "R2_BINDING";

/// Binding names exposed to the Worker.
pub const D1_BINDING_NAME: &str = "DB";
pub const R2_BINDING_NAME: &str = "ASSETS";

/// Reconciliation facts that drive conditional sections.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub capabilities: Option<Capabilities>,
}

impl RenderContext {
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities: Some(capabilities),
        }
    }

    fn skip_reason(&self, kind: ResourceKind) -> String {
        match &self.capabilities {
            Some(caps) if !caps.can_use(kind) => {
                format!("no {} permission", kind.step_id().to_uppercase())
            }
            _ => "not provisioned yet".to_string(),
        }
    }
}

/// Renders `{{NAME}}` templates against a resolved configuration.
pub struct ConfigRenderer {
    placeholder: Regex,
    leftover: Regex,
}

impl Default for ConfigRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRenderer {
    pub fn new() -> Self {
        Self {
            // Match {{IDENT}} pattern
            placeholder: Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}").unwrap(),
            leftover: Regex::new(r"\{\{[^\n]*?\}\}").unwrap(),
        }
    }

    /// Render a template.
    ///
    /// Every placeholder must be a known configuration key or a conditional
    /// section; the first unknown one fails the whole render.
    pub fn render(
        &self,
        template: &str,
        config: &ResolvedConfig,
        context: Option<&RenderContext>,
    ) -> TemplateResult<String> {
        let default_context = RenderContext::default();
        let context = context.unwrap_or(&default_context);

        // Only the template is scanned; substituted values may contain braces
        if let Some(found) = self.malformed(template) {
            return Err(TemplateError::UnresolvedPlaceholder(found.to_string()));
        }

        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        let mut substituted = 0usize;

        for caps in self.placeholder.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            let name = &caps[1];
            let replacement = self.resolve(name, config, context)?;

            out.push_str(&template[last..whole.start()]);
            out.push_str(&replacement);
            last = whole.end();
            substituted += 1;
        }
        out.push_str(&template[last..]);

        debug!("Rendered template with {} placeholder(s)", substituted);
        Ok(out)
    }

    /// First `{{...}}` in the template that is not a well-formed placeholder.
    fn malformed<'t>(&self, template: &'t str) -> Option<&'t str> {
        self.leftover
            .find_iter(template)
            .map(|m| m.as_str())
            .find(|candidate| {
                self.placeholder.find(candidate).map(|m| m.range()) != Some(0..candidate.len())
            })
    }

    fn resolve(
        &self,
        name: &str,
        config: &ResolvedConfig,
        context: &RenderContext,
    ) -> TemplateResult<String> {
        match name {
            D1_BINDING => Ok(d1_section(config, context)),
            R2_BINDING => Ok(r2_section(config, context)),
            _ if schema::lookup(name).is_some() || config.get(name).is_some() => {
                Ok(escape_toml(config.value(name)))
            }
            _ => Err(TemplateError::UnknownPlaceholder(name.to_string())),
        }
    }
}

fn d1_section(config: &ResolvedConfig, context: &RenderContext) -> String {
    match config.non_empty(keys::D1_DATABASE_ID) {
        Some(id) => {
            let name = config
                .non_empty(keys::D1_DATABASE_NAME)
                .map(str::to_string)
                .unwrap_or_else(|| ResourceKind::Database.resource_name(config.project_name()));
            format!(
                "[[d1_databases]]\nbinding = \"{}\"\ndatabase_name = \"{}\"\ndatabase_id = \"{}\"",
                D1_BINDING_NAME,
                escape_toml(&name),
                escape_toml(id)
            )
        }
        None => format!(
            "# D1 binding skipped ({})",
            context.skip_reason(ResourceKind::Database)
        ),
    }
}

fn r2_section(config: &ResolvedConfig, context: &RenderContext) -> String {
    match config.non_empty(keys::R2_BUCKET_NAME) {
        Some(bucket) => format!(
            "[[r2_buckets]]\nbinding = \"{}\"\nbucket_name = \"{}\"",
            R2_BINDING_NAME,
            escape_toml(bucket)
        ),
        None => format!(
            "# R2 binding skipped ({})",
            context.skip_reason(ResourceKind::Bucket)
        ),
    }
}

/// Escape a value for a TOML basic string body.
///
/// Quotes, backslashes, newlines, tabs and carriage returns are escaped;
/// other control characters pass through unchanged.
pub fn escape_toml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}
