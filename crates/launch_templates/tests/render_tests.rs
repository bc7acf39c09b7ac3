//! Rendering tests against resolved configurations.

use std::collections::BTreeMap;
use std::fs;

use launch_env::{keys, EnvResolver, ResolvedConfig};
use launch_iac::Capabilities;
use launch_templates::{
    generated, ConfigRenderer, RenderContext, TemplateError, DEFAULT_WRANGLER_TEMPLATE,
};
use tempfile::tempdir;

fn config_with(overrides: &[(&str, &str)]) -> ResolvedConfig {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(".env"),
        "PROJECT_NAME=shop\n\
         PROJECT_DOMAIN=https://shop.example.com/\n\
         CLOUDFLARE_ACCOUNT_ID=acc123\n\
         AUTH_DOMAIN=https://auth.example.com\n\
         AUTH_CLIENT_ID=cid\n\
         AUTH_CLIENT_SECRET=csecret\n\
         STRIPE_SECRET_KEY=sk_test_1\n",
    )
    .unwrap();
    let overrides: BTreeMap<String, String> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvResolver::with_process_env(BTreeMap::new())
        .resolve(dir.path(), &overrides)
        .unwrap()
}

#[test]
fn test_default_template_renders_completely() {
    let config = config_with(&[
        (keys::D1_DATABASE_NAME, "shop-db"),
        (keys::D1_DATABASE_ID, "7c3e1f0a-5b2d"),
        (keys::R2_BUCKET_NAME, "shop-assets"),
    ]);

    let out = ConfigRenderer::new()
        .render(DEFAULT_WRANGLER_TEMPLATE, &config, None)
        .unwrap();

    assert!(!out.contains("{{"));
    let parsed: toml::Value = toml::from_str(&out).unwrap();
    assert_eq!(parsed["name"].as_str(), Some("shop"));
    assert_eq!(parsed["account_id"].as_str(), Some("acc123"));
    assert_eq!(parsed["vars"]["APP_URL"].as_str(), Some("https://shop.example.com/app"));
    assert_eq!(parsed["vars"]["AUTH_AUDIENCE"].as_str(), Some("https://shop.example.com/api"));

    let d1 = &parsed["d1_databases"][0];
    assert_eq!(d1["binding"].as_str(), Some("DB"));
    assert_eq!(d1["database_id"].as_str(), Some("7c3e1f0a-5b2d"));
    assert_eq!(parsed["r2_buckets"][0]["bucket_name"].as_str(), Some("shop-assets"));
}

#[test]
fn test_unprovisioned_sections_become_comments() {
    let config = config_with(&[]);
    let caps = Capabilities {
        authenticated: true,
        can_use_d1: false,
        can_use_r2: true,
        identity: None,
    };
    let ctx = RenderContext::with_capabilities(caps);

    let out = ConfigRenderer::new()
        .render(DEFAULT_WRANGLER_TEMPLATE, &config, Some(&ctx))
        .unwrap();

    assert!(out.contains("# D1 binding skipped (no D1 permission)"));
    assert!(out.contains("# R2 binding skipped (not provisioned yet)"));
    let parsed: toml::Value = toml::from_str(&out).unwrap();
    assert!(parsed.get("d1_databases").is_none());
}

#[test]
fn test_unknown_placeholder_fails() {
    let config = config_with(&[]);
    let err = ConfigRenderer::new()
        .render("name = \"{{PROJECT_NAME}}\"\nx = \"{{NOT_A_KEY}}\"\n", &config, None)
        .unwrap_err();
    assert!(matches!(err, TemplateError::UnknownPlaceholder(ref n) if n == "NOT_A_KEY"));
    assert_eq!(err.to_string(), "Unknown template placeholder: {{NOT_A_KEY}}");
}

#[test]
fn test_malformed_placeholder_is_unresolved() {
    let config = config_with(&[]);
    let err = ConfigRenderer::new()
        .render("x = \"{{ PROJECT_NAME }}\"", &config, None)
        .unwrap_err();
    assert!(matches!(err, TemplateError::UnresolvedPlaceholder(_)));
}

#[test]
fn test_braces_inside_values_are_kept() {
    let config = config_with(&[("MOTTO", "use {{NAME}} and {{ spaced }}")]);
    let out = ConfigRenderer::new()
        .render("motto = \"{{MOTTO}}\"\n", &config, None)
        .unwrap();
    assert_eq!(out, "motto = \"use {{NAME}} and {{ spaced }}\"\n");
}

#[test]
fn test_values_are_escaped_and_unset_keys_are_empty() {
    let config = config_with(&[("MOTTO", "say \"hi\"\\now")]);
    let out = ConfigRenderer::new()
        .render(
            "motto = \"{{MOTTO}}\"\nwebhook = \"{{STRIPE_WEBHOOK_SECRET}}\"\n",
            &config,
            None,
        )
        .unwrap();

    assert_eq!(out, "motto = \"say \\\"hi\\\"\\\\now\"\nwebhook = \"\"\n");
    let parsed: toml::Value = toml::from_str(&out).unwrap();
    assert_eq!(parsed["motto"].as_str(), Some("say \"hi\"\\now"));
}

#[test]
fn test_project_template_takes_precedence() {
    let dir = tempdir().unwrap();
    let config = config_with(&[]);

    let builtin = generated::wrangler_file(dir.path(), &config, None).unwrap();
    assert!(builtin.content.contains("compatibility_date"));

    fs::write(
        dir.path().join(generated::WRANGLER_TEMPLATE_FILE),
        "name = \"{{PROJECT_NAME}}-custom\"\n",
    )
    .unwrap();
    let custom = generated::wrangler_file(dir.path(), &config, None).unwrap();
    assert_eq!(custom.path.to_str(), Some(generated::WRANGLER_FILE));
    assert_eq!(custom.content, "name = \"shop-custom\"\n");
}
