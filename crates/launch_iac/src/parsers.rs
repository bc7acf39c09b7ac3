//! Parsers for provider output.
//!
//! The provider prints JSON for some commands, box-drawn tables or
//! `key: value` blocks for others, and the HTTP API wraps everything in an
//! envelope. Each parser is pure and returns `None` when it cannot produce a
//! non-empty result, so callers can try them in order.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::resource::{RemoteResource, ResourceKind};

/// A parser over raw command output.
pub type TextParser = fn(&str) -> Option<Vec<RemoteResource>>;

/// Text parsers in preference order.
pub const LISTING_PARSERS: &[(&str, TextParser)] =
    &[("json", parse_json_listing), ("table", parse_table_listing)];

const ID_FIELDS: &[&str] = &["uuid", "id", "database_id"];
const HEADER_WORDS: &[&str] = &["name", "uuid", "id", "database_id", "database_name"];

fn uuid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("static uuid pattern")
    })
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("static name pattern"))
}

fn database_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""?database_id"?\s*[=:]\s*"([A-Za-z0-9-]+)""#).expect("static id pattern")
    })
}

fn database_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""?database_name"?\s*[=:]\s*"([^"]+)""#).expect("static name pattern")
    })
}

/// Database id from a block of `wrangler d1 create` output whose
/// `database_name` is `name`. A block without a name only counts when the
/// output mentions `name` somewhere else.
fn created_database_id(name: &str, text: &str) -> Option<String> {
    let named_anywhere = database_name_regex().is_match(text);
    text.split("[[").find_map(|block| {
        let id = database_id_regex().captures(block)?[1].to_string();
        match database_name_regex().captures(block) {
            Some(caps) if &caps[1] == name => Some(id),
            Some(_) => None,
            None if !named_anywhere && text.contains(name) => Some(id),
            None => None,
        }
    })
}

fn created_bucket_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)created bucket\s+['"`]?([A-Za-z0-9._-]+)"#).expect("static bucket pattern")
    })
}

fn non_empty(found: Vec<RemoteResource>) -> Option<Vec<RemoteResource>> {
    (!found.is_empty()).then_some(found)
}

fn resource_from_object(item: &Value) -> Option<RemoteResource> {
    let name = item.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    let id = ID_FIELDS
        .iter()
        .find_map(|field| item.get(*field).and_then(|v| v.as_str()))
        .map(|s| s.to_string());
    Some(RemoteResource::new(name, id))
}

fn resources_from_array(items: &[Value]) -> Vec<RemoteResource> {
    items.iter().filter_map(resource_from_object).collect()
}

/// Find the resource array in a JSON document.
fn resources_from_value(value: &Value) -> Option<Vec<RemoteResource>> {
    let found = match value {
        Value::Array(items) => resources_from_array(items),
        Value::Object(_) => {
            let result = value.get("result").unwrap_or(value);
            if let Some(items) = result.as_array() {
                resources_from_array(items)
            } else if let Some(items) = result.get("buckets").and_then(|b| b.as_array()) {
                resources_from_array(items)
            } else {
                resource_from_object(result).into_iter().collect()
            }
        }
        _ => Vec::new(),
    };
    non_empty(found)
}

/// Structured (JSON) listing output.
pub fn parse_json_listing(text: &str) -> Option<Vec<RemoteResource>> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    resources_from_value(&value)
}

fn is_separator_line(line: &str) -> bool {
    line.chars().all(|c| {
        matches!(c, '-' | '=' | '+' | '|' | ':' | ' ')
            || ('\u{2500}'..='\u{257F}').contains(&c)
    })
}

fn looks_like_name(token: &str) -> bool {
    name_regex().is_match(token)
        && token.chars().any(|c| c.is_ascii_alphabetic())
        && !uuid_regex().is_match(token)
}

fn row_resource(tokens: &[&str]) -> Option<RemoteResource> {
    let id = tokens
        .iter()
        .find(|t| uuid_regex().is_match(t))
        .map(|t| t.to_string());
    let name = tokens.iter().find(|t| looks_like_name(t))?;
    Some(RemoteResource::new(*name, id))
}

/// Tabular or `key: value` listing output.
///
/// Understands box-drawn tables (`│ uuid │ name │ ... │`), pipe tables, and
/// the `name: <bucket>` blocks printed for buckets. Banner, progress,
/// header and separator lines are dropped.
pub fn parse_table_listing(text: &str) -> Option<Vec<RemoteResource>> {
    let mut found: Vec<RemoteResource> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || is_separator_line(line) {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            if !key.contains(' ') && !key.contains('│') && !key.contains('|') {
                match key.as_str() {
                    "name" if looks_like_name(value) => {
                        found.push(RemoteResource::new(value, None));
                    }
                    "id" | "uuid" | "database_id" => {
                        if let Some(last) = found.last_mut() {
                            if last.id.is_none() && !value.is_empty() {
                                last.id = Some(value.to_string());
                            }
                        }
                    }
                    _ => {}
                }
                continue;
            }
        }

        let has_pipes = line.contains('│') || line.contains('|');
        let tokens: Vec<&str> = if has_pipes {
            line.split(['│', '|'])
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect()
        } else {
            line.split_whitespace().collect()
        };

        let Some(first) = tokens.first() else {
            continue;
        };
        if HEADER_WORDS.contains(&first.to_ascii_lowercase().as_str()) {
            continue;
        }

        let accept = has_pipes
            || tokens.len() == 1
            || tokens.iter().any(|t| uuid_regex().is_match(t));
        if !accept {
            continue;
        }

        if let Some(resource) = row_resource(&tokens) {
            found.push(resource);
        }
    }

    non_empty(found)
}

/// HTTP API listing envelope (`{"result": [...]}` or `{"result": {"buckets": [...]}}`).
pub fn parse_api_listing(value: &Value) -> Option<Vec<RemoteResource>> {
    resources_from_value(value)
}

/// Extract the created resource from a create command's own output.
pub fn parse_creation_response(
    kind: ResourceKind,
    name: &str,
    text: &str,
) -> Option<RemoteResource> {
    if let Some(found) = parse_json_listing(text) {
        if let Some(resource) = find_named(&found, name) {
            return Some(resource);
        }
    }

    match kind {
        ResourceKind::Database => {
            created_database_id(name, text).map(|id| RemoteResource::new(name, Some(id)))
        }
        ResourceKind::Bucket => created_bucket_regex()
            .captures(text)
            .filter(|caps| &caps[1] == name)
            .map(|_| RemoteResource::new(name, None)),
    }
}

/// Extract a resource from a describe command's output.
pub fn parse_describe_response(
    kind: ResourceKind,
    name: &str,
    text: &str,
) -> Option<RemoteResource> {
    LISTING_PARSERS
        .iter()
        .filter_map(|(_, parser)| parser(text))
        .find_map(|found| find_named(&found, name))
        .filter(|resource| resource.is_usable(kind))
}

/// Find an entry by exact name.
pub fn find_named(found: &[RemoteResource], name: &str) -> Option<RemoteResource> {
    found.iter().find(|r| r.name == name).cloned()
}

/// Pull an account identity (e-mail) out of `whoami` output.
pub fn parse_identity(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+").expect("static email pattern")
    });
    re.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const D1_JSON: &str = r#"[
        {"uuid": "7c3e1f0a-5b2d-4c8e-9f01-aa22bb33cc44", "name": "shop-db", "created_at": "2024-05-01T10:00:00Z"},
        {"uuid": "11111111-2222-3333-4444-555555555555", "name": "other-db"}
    ]"#;

    const D1_TABLE: &str = "\
┌──────────────────────────────────────┬─────────┬──────────────────────────┐
│ uuid                                 │ name    │ created_at               │
├──────────────────────────────────────┼─────────┼──────────────────────────┤
│ 7c3e1f0a-5b2d-4c8e-9f01-aa22bb33cc44 │ shop-db │ 2024-05-01T10:00:00.000Z │
└──────────────────────────────────────┴─────────┴──────────────────────────┘";

    const R2_TEXT: &str = "\
 ⛅️ wrangler 3.57.0
-------------------
Listing buckets...
name:           shop-assets
creation_date:  2024-05-01T10:00:00.000Z

name:           legacy-bucket
creation_date:  2023-01-01T00:00:00.000Z
";

    #[test]
    fn test_json_listing() {
        let found = parse_json_listing(D1_JSON).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "shop-db");
        assert_eq!(found[0].id.as_deref(), Some("7c3e1f0a-5b2d-4c8e-9f01-aa22bb33cc44"));
        assert!(parse_json_listing("[]").is_none());
        assert!(parse_json_listing("not json").is_none());
    }

    #[test]
    fn test_box_table_listing() {
        assert!(parse_json_listing(D1_TABLE).is_none());
        let found = parse_table_listing(D1_TABLE).unwrap();
        assert_eq!(
            found,
            vec![RemoteResource::new(
                "shop-db",
                Some("7c3e1f0a-5b2d-4c8e-9f01-aa22bb33cc44".to_string())
            )]
        );
    }

    #[test]
    fn test_key_value_listing_ignores_noise() {
        let found = parse_table_listing(R2_TEXT).unwrap();
        let names: Vec<&str> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["shop-assets", "legacy-bucket"]);
    }

    #[test]
    fn test_plain_single_column_listing() {
        let found = parse_table_listing("NAME\nshop-assets\nmedia\n").unwrap();
        let names: Vec<&str> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["shop-assets", "media"]);
        assert!(parse_table_listing("Listing buckets...\n").is_none());
    }

    #[test]
    fn test_api_envelopes() {
        let d1 = serde_json::json!({
            "success": true,
            "result": [{"uuid": "abc-1", "name": "shop-db"}]
        });
        assert_eq!(parse_api_listing(&d1).unwrap()[0].id.as_deref(), Some("abc-1"));

        let r2 = serde_json::json!({
            "success": true,
            "result": {"buckets": [{"name": "shop-assets", "creation_date": "x"}]}
        });
        assert_eq!(parse_api_listing(&r2).unwrap()[0].name, "shop-assets");

        let empty = serde_json::json!({"result": {"buckets": []}});
        assert!(parse_api_listing(&empty).is_none());
    }

    #[test]
    fn test_creation_responses() {
        let d1_out = "✅ Successfully created DB 'shop-db'\n\n[[d1_databases]]\nbinding = \"DB\"\ndatabase_name = \"shop-db\"\ndatabase_id = \"7c3e1f0a-5b2d-4c8e-9f01-aa22bb33cc44\"\n";
        let created = parse_creation_response(ResourceKind::Database, "shop-db", d1_out).unwrap();
        assert_eq!(created.id.as_deref(), Some("7c3e1f0a-5b2d-4c8e-9f01-aa22bb33cc44"));

        let d1_json = r#"{"d1_databases":[{"binding":"DB","database_name":"shop-db","database_id":"abc-123"}]}"#;
        let created = parse_creation_response(ResourceKind::Database, "shop-db", d1_json).unwrap();
        assert_eq!(created.id.as_deref(), Some("abc-123"));

        let r2_out = "Creating bucket shop-assets...\nCreated bucket 'shop-assets' with default storage class of Standard.";
        assert!(parse_creation_response(ResourceKind::Bucket, "shop-assets", r2_out).is_some());
        assert!(parse_creation_response(ResourceKind::Bucket, "other", r2_out).is_none());
        assert!(parse_creation_response(ResourceKind::Database, "shop-db", "done").is_none());
    }

    #[test]
    fn test_creation_response_requires_matching_name() {
        let other = "[[d1_databases]]\nbinding = \"DB\"\ndatabase_name = \"legacy-db\"\ndatabase_id = \"aaaa-1111\"\n";
        assert!(parse_creation_response(ResourceKind::Database, "shop-db", other).is_none());

        let both = format!(
            "{}\n[[d1_databases]]\nbinding = \"DB\"\ndatabase_name = \"shop-db\"\ndatabase_id = \"bbbb-2222\"\n",
            other
        );
        let created = parse_creation_response(ResourceKind::Database, "shop-db", &both).unwrap();
        assert_eq!(created.id.as_deref(), Some("bbbb-2222"));

        let json_other = r#"{"d1_databases":[{"database_name":"legacy-db","database_id":"aaaa-1111"}]}"#;
        assert!(parse_creation_response(ResourceKind::Database, "shop-db", json_other).is_none());
    }

    #[test]
    fn test_describe_response() {
        let info = r#"{"uuid": "abc-123", "name": "shop-db", "num_tables": 3}"#;
        let found = parse_describe_response(ResourceKind::Database, "shop-db", info).unwrap();
        assert_eq!(found.id.as_deref(), Some("abc-123"));

        let bucket = "name: shop-assets\ncreated: 2024-05-01\n";
        assert!(parse_describe_response(ResourceKind::Bucket, "shop-assets", bucket).is_some());
        assert!(parse_describe_response(ResourceKind::Bucket, "x", bucket).is_none());
    }

    #[test]
    fn test_identity() {
        let out = "Getting User settings...\n👋 You are logged in with an OAuth Token, associated with the email dev@example.com.";
        assert_eq!(parse_identity(out).as_deref(), Some("dev@example.com"));
        assert_eq!(parse_identity("You are not authenticated."), None);
    }
}
