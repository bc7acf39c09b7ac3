//! Display redaction for resolved values.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::EnvSource;

/// Key-name fragments that mark a value as sensitive.
pub const SENSITIVE_KEYWORDS: &[&str] = &["TOKEN", "SECRET", "KEY", "PASSWORD", "CLIENT", "AUTH"];

/// Marker shown for empty values.
pub const EMPTY_MARKER: &str = "<empty>";

/// Whether a key name contains a sensitive keyword (case-insensitive).
pub fn is_sensitive(key: &str) -> bool {
    let upper = key.to_ascii_uppercase();
    SENSITIVE_KEYWORDS.iter().any(|word| upper.contains(word))
}

/// Display form of a value.
pub fn redact_value(key: &str, value: &str) -> String {
    if value.is_empty() {
        return EMPTY_MARKER.to_string();
    }
    if !is_sensitive(key) {
        return value.to_string();
    }

    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        let mut out: String = chars[..1].iter().collect();
        out.push_str("***");
        return out;
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Redacted view of a resolved configuration. Never holds raw secrets.
#[derive(Debug, Clone, Serialize)]
pub struct RedactedReport {
    pub sources: Vec<EnvSource>,
    pub redacted: BTreeMap<String, String>,
    pub summary: String,
}

impl RedactedReport {
    pub(crate) fn build<'a>(
        sources: &[EnvSource],
        values: impl IntoIterator<Item = (&'a str, &'a str)>,
        missing_generated: &[String],
    ) -> Self {
        let redacted: BTreeMap<String, String> = values
            .into_iter()
            .map(|(key, value)| (key.to_string(), redact_value(key, value)))
            .collect();

        let mut summary = String::from("Sources:\n");
        for source in sources {
            summary.push_str(&format!(
                "  [{}] {} ({})\n",
                source.category,
                source.path.display(),
                if source.exists { "found" } else { "missing" }
            ));
        }
        summary.push_str("Resolved values:\n");
        for (key, display) in &redacted {
            summary.push_str(&format!("  {}={}\n", key, display));
        }
        if !missing_generated.is_empty() {
            summary.push_str(&format!(
                "Missing generated values: {}\n",
                missing_generated.join(", ")
            ));
        }

        Self {
            sources: sources.to_vec(),
            redacted,
            summary,
        }
    }
}
