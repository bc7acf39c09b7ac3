//! Integration tests for environment resolution.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use launch_env::{keys, EnvError, EnvResolver, LayerKind};
use tempfile::tempdir;

const MINIMAL_BASE: &str = r#"
PROJECT_NAME=demo-app
PROJECT_DOMAIN=https://example.com/
CLOUDFLARE_ACCOUNT_ID=abc123
AUTH_DOMAIN=https://auth.example.com
AUTH_CLIENT_ID=client-1
AUTH_CLIENT_SECRET=client-secret-value
STRIPE_SECRET_KEY=sk_test_base
"#;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn resolver() -> EnvResolver {
    EnvResolver::with_process_env(BTreeMap::new())
}

#[test]
fn test_higher_precedence_file_wins() {
    let dir = tempdir().unwrap();
    write(dir.path(), ".env", &format!("{}\nSECRET=a\n", MINIMAL_BASE));
    write(dir.path(), ".env.local", "SECRET=b\n");

    let config = resolver().resolve(dir.path(), &BTreeMap::new()).unwrap();
    assert_eq!(config.get("SECRET"), Some("b"));
    // Unknown keys follow the layer of the file they came from
    assert_eq!(config.base.get("SECRET"), Some("b"));
}

#[test]
fn test_derivation_from_project_domain() {
    let dir = tempdir().unwrap();
    write(dir.path(), ".env", MINIMAL_BASE);

    let config = resolver().resolve(dir.path(), &BTreeMap::new()).unwrap();
    assert_eq!(config.get(keys::APP_URL), Some("https://example.com/app"));
    assert_eq!(config.get(keys::WORKER_ORIGIN), Some("https://example.com"));
    assert_eq!(config.get(keys::AUTH_AUDIENCE), Some("https://example.com/api"));
}

#[test]
fn test_generated_files_route_to_generated_layer() {
    let dir = tempdir().unwrap();
    write(dir.path(), ".env", &format!("{}\nD1_DATABASE_ID=from-base-file\n", MINIMAL_BASE));
    write(dir.path(), ".env.generated", "D1_DATABASE_ID=db-1\nTOOL_NOTE=x\n");
    write(dir.path(), ".env.generated.local", "D1_DATABASE_ID=db-2\n");

    let config = resolver().resolve(dir.path(), &BTreeMap::new()).unwrap();
    assert_eq!(config.generated.get(keys::D1_DATABASE_ID), Some("db-2"));
    assert!(!config.base.contains(keys::D1_DATABASE_ID));
    assert_eq!(config.generated.get("TOOL_NOTE"), Some("x"));

    let categories: Vec<(String, bool, LayerKind)> = config
        .sources
        .iter()
        .map(|s| {
            (
                s.path.file_name().unwrap().to_string_lossy().to_string(),
                s.exists,
                s.category,
            )
        })
        .collect();
    assert_eq!(
        categories,
        vec![
            (".env".to_string(), true, LayerKind::Base),
            (".env.local".to_string(), false, LayerKind::Base),
            (".env.generated".to_string(), true, LayerKind::Generated),
            (".env.generated.local".to_string(), true, LayerKind::Generated),
        ]
    );
}

#[test]
fn test_process_env_and_overrides_take_precedence() {
    let dir = tempdir().unwrap();
    write(dir.path(), ".env", MINIMAL_BASE);

    let mut process = BTreeMap::new();
    process.insert(keys::STRIPE_SECRET_KEY.to_string(), "sk_from_env".to_string());
    process.insert(keys::AUTH_CLIENT_ID.to_string(), "client-env".to_string());

    let mut overrides = BTreeMap::new();
    overrides.insert(keys::AUTH_CLIENT_ID.to_string(), "client-override".to_string());
    overrides.insert("EXTRA_FLAG".to_string(), "on".to_string());

    let config = EnvResolver::with_process_env(process)
        .resolve(dir.path(), &overrides)
        .unwrap();

    assert_eq!(config.get(keys::STRIPE_SECRET_KEY), Some("sk_from_env"));
    assert_eq!(config.get(keys::AUTH_CLIENT_ID), Some("client-override"));
    // Unknown override keys land in the generated layer
    assert_eq!(config.generated.get("EXTRA_FLAG"), Some("on"));
}

#[test]
fn test_override_only_domain_still_derives() {
    let dir = tempdir().unwrap();
    let without_domain: String = MINIMAL_BASE
        .lines()
        .filter(|l| !l.starts_with("PROJECT_DOMAIN"))
        .collect::<Vec<_>>()
        .join("\n");
    write(dir.path(), ".env", &without_domain);

    let mut overrides = BTreeMap::new();
    overrides.insert(keys::PROJECT_DOMAIN.to_string(), "https://override.dev".to_string());

    let config = resolver().resolve(dir.path(), &overrides).unwrap();
    assert_eq!(config.get(keys::APP_URL), Some("https://override.dev/app"));
    assert_eq!(config.base.get(keys::PROJECT_DOMAIN), Some("https://override.dev"));
}

#[test]
fn test_stripe_test_key_fallback() {
    let dir = tempdir().unwrap();
    let without_live: String = MINIMAL_BASE
        .lines()
        .filter(|l| !l.starts_with("STRIPE_SECRET_KEY"))
        .collect::<Vec<_>>()
        .join("\n");
    write(
        dir.path(),
        ".env",
        &format!("{}\nSTRIPE_TEST_SECRET_KEY=sk_test_fallback\n", without_live),
    );

    let config = resolver().resolve(dir.path(), &BTreeMap::new()).unwrap();
    assert_eq!(config.get(keys::STRIPE_SECRET_KEY), Some("sk_test_fallback"));
}

#[test]
fn test_validation_collects_every_violation() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        ".env",
        "PROJECT_NAME=Not_A_Slug\nPROJECT_DOMAIN=example.com\nCLOUDFLARE_ACCOUNT_ID=abc\n",
    );
    write(dir.path(), ".env.generated", "D1_DATABASE_ID=\"bad id\"\n");

    let err = resolver().resolve(dir.path(), &BTreeMap::new()).unwrap_err();
    let EnvError::Validation(errors) = err else {
        panic!("expected validation error");
    };

    assert!(errors.mentions(keys::PROJECT_NAME));
    assert!(errors.mentions(keys::PROJECT_DOMAIN));
    assert!(errors.mentions(keys::AUTH_CLIENT_ID));
    assert!(errors.mentions(keys::AUTH_CLIENT_SECRET));
    assert!(errors.mentions(keys::STRIPE_SECRET_KEY));
    assert!(errors.mentions(keys::D1_DATABASE_ID));
    assert!(!errors.mentions(keys::CLOUDFLARE_ACCOUNT_ID));
    assert!(errors.len() >= 6);

    let message = errors.to_string();
    assert!(message.contains("PROJECT_NAME must match"));
    assert!(message.contains("AUTH_CLIENT_SECRET is required"));
}

#[test]
fn test_missing_generated_values_are_not_errors() {
    let dir = tempdir().unwrap();
    write(dir.path(), ".env", MINIMAL_BASE);

    let config = resolver().resolve(dir.path(), &BTreeMap::new()).unwrap();
    assert!(config.missing_generated.contains(&keys::D1_DATABASE_ID.to_string()));
    assert!(config.missing_generated.contains(&keys::R2_BUCKET_NAME.to_string()));
}

#[test]
fn test_redacted_report_hides_secrets() {
    let dir = tempdir().unwrap();
    write(dir.path(), ".env", &format!("{}\nSTRIPE_WEBHOOK_SECRET=\n", MINIMAL_BASE));

    let config = resolver().resolve(dir.path(), &BTreeMap::new()).unwrap();
    let report = config.redacted_report();

    assert_eq!(report.redacted.get(keys::AUTH_CLIENT_SECRET).unwrap(), "clie...ue");
    assert_eq!(report.redacted.get(keys::STRIPE_WEBHOOK_SECRET).unwrap(), "<empty>");
    assert_eq!(report.redacted.get(keys::PROJECT_NAME).unwrap(), "demo-app");
    assert!(!report.summary.contains("client-secret-value"));
    assert!(report.summary.contains(".env.local (missing)"));
    // The resolved config itself keeps the raw value
    assert_eq!(config.get(keys::AUTH_CLIENT_SECRET), Some("client-secret-value"));
}

#[test]
fn test_generated_file_keeps_only_its_own_values() {
    let dir = tempdir().unwrap();
    write(dir.path(), ".env", MINIMAL_BASE);
    write(dir.path(), ".env.generated", "D1_DATABASE_ID=shared-db\n");
    write(dir.path(), ".env.generated.local", "D1_DATABASE_ID=my-local-db\n");

    let mut process = BTreeMap::new();
    process.insert(keys::SESSION_SECRET.to_string(), "shell-session-secret".to_string());
    let mut overrides = BTreeMap::new();
    overrides.insert("EXTRA_FLAG".to_string(), "on".to_string());

    let config = EnvResolver::with_process_env(process)
        .resolve(dir.path(), &overrides)
        .unwrap();

    // Resolution sees the local override and the shell value
    assert_eq!(config.get(keys::D1_DATABASE_ID), Some("my-local-db"));
    assert_eq!(config.get(keys::SESSION_SECRET), Some("shell-session-secret"));

    let file = config.generated_env_file();
    assert!(file.contains("D1_DATABASE_ID=\"shared-db\""));
    assert!(!file.contains("my-local-db"));
    assert!(!file.contains("shell-session-secret"));
    assert!(!file.contains("EXTRA_FLAG"));

    // Values merged after load time are written
    let mut updates = BTreeMap::new();
    updates.insert(keys::R2_BUCKET_NAME.to_string(), "shop-assets".to_string());
    let merged = config.merge_generated(&updates).generated_env_file();
    assert!(merged.contains("R2_BUCKET_NAME=\"shop-assets\""));
    assert!(merged.contains("D1_DATABASE_ID=\"shared-db\""));
}
