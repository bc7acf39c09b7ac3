//! Integration tests for reconciliation against a mocked provider.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use launch_env::{keys, EnvResolver, ResolvedConfig};
use launch_iac::{
    Capabilities, ExecuteOptions, GetOrCreate, IacError, Reconciler, ResourceAction,
    ResourceKind, StepStatus,
};
use launch_provider::{CommandOutput, MockProvider};
use tempfile::tempdir;

const DB_ID: &str = "7c3e1f0a-5b2d-4c8e-9f01-aa22bb33cc44";

fn config_with(extra: &str) -> ResolvedConfig {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(".env"),
        format!(
            "PROJECT_NAME=shop\n\
             PROJECT_DOMAIN=https://shop.example.com\n\
             CLOUDFLARE_ACCOUNT_ID=acc123\n\
             AUTH_DOMAIN=https://auth.example.com\n\
             AUTH_CLIENT_ID=cid\n\
             AUTH_CLIENT_SECRET=csecret\n\
             STRIPE_SECRET_KEY=sk_test_1\n{}",
            extra
        ),
    )
    .unwrap();
    EnvResolver::with_process_env(BTreeMap::new())
        .resolve(dir.path(), &BTreeMap::new())
        .unwrap()
}

fn config() -> ResolvedConfig {
    config_with("")
}

fn reconciler(mock: &MockProvider) -> Reconciler {
    Reconciler::new(Arc::new(mock.clone()))
}

#[tokio::test]
async fn test_detect_capabilities_tolerates_failures() {
    let mock = MockProvider::new()
        .on(
            "whoami",
            CommandOutput::success("You are logged in, associated with the email ops@shop.dev."),
        )
        .on("d1 list", CommandOutput::success("[]"))
        .on("r2 bucket list", CommandOutput::failure(1, "Authentication error [code: 10000]"));

    let caps = reconciler(&mock).detect_capabilities(&config()).await;

    assert!(caps.authenticated);
    assert!(caps.can_use_d1);
    assert!(!caps.can_use_r2);
    assert_eq!(caps.identity.as_deref(), Some("ops@shop.dev"));
}

#[tokio::test]
async fn test_unauthenticated_detection() {
    let mock = MockProvider::new().on("whoami", CommandOutput::success("You are not authenticated."));
    let caps = reconciler(&mock).detect_capabilities(&config()).await;
    assert_eq!(caps, Capabilities::default());
}

#[test]
fn test_plan_names_and_gating() {
    let caps = Capabilities {
        authenticated: true,
        can_use_d1: true,
        can_use_r2: false,
        identity: None,
    };
    let plan = Reconciler::build_plan(&config(), &caps);

    let d1 = plan.step("d1").unwrap();
    assert_eq!(d1.status, StepStatus::Ensure);
    assert_eq!(d1.target.as_deref(), Some("shop-db"));

    let r2 = plan.step("r2").unwrap();
    assert_eq!(r2.status, StepStatus::Skip);
    assert_eq!(r2.target.as_deref(), Some("shop-assets"));

    assert_eq!(plan.step("worker").unwrap().status, StepStatus::Noop);
    assert_eq!(plan.notes.len(), 1);
    assert!(plan.describe().contains("[skip  ] r2"));
}

#[tokio::test]
async fn test_capability_absent_never_creates() {
    for dry_run in [false, true] {
        let mock = MockProvider::new();
        let plan = Reconciler::build_plan(&config(), &Capabilities::default());
        let result = reconciler(&mock)
            .execute(&plan, &config(), ExecuteOptions { dry_run })
            .await
            .unwrap();

        assert!(mock.calls().is_empty(), "no provider call expected");
        assert_eq!(result.outcome("d1").unwrap().action, ResourceAction::Skipped);
        assert_eq!(result.outcome("r2").unwrap().action, ResourceAction::Skipped);
        if dry_run {
            assert!(result.updates.is_empty());
        } else {
            assert_eq!(result.updates.get(keys::D1_DATABASE_ID).map(String::as_str), Some(""));
            assert_eq!(result.updates.get(keys::R2_BUCKET_NAME).map(String::as_str), Some(""));
        }
    }
}

#[tokio::test]
async fn test_existing_resources_are_reused() {
    let mock = MockProvider::new()
        .on(
            "d1 list",
            CommandOutput::success(format!(r#"[{{"uuid":"{}","name":"shop-db"}}]"#, DB_ID)),
        )
        .on("r2 bucket list", CommandOutput::success("name: shop-assets\ncreation_date: 2024-01-01\n"));

    let plan = Reconciler::build_plan(&config(), &Capabilities::full("ops@shop.dev"));
    let result = reconciler(&mock)
        .execute(&plan, &config(), ExecuteOptions::default())
        .await
        .unwrap();

    assert!(!mock.any_mutating());
    assert_eq!(result.outcome("d1").unwrap().action, ResourceAction::Reused);
    assert_eq!(result.outcome("r2").unwrap().action, ResourceAction::Reused);
    assert_eq!(result.updates.get(keys::D1_DATABASE_NAME).unwrap(), "shop-db");
    assert_eq!(result.updates.get(keys::D1_DATABASE_ID).unwrap(), DB_ID);
    assert_eq!(result.updates.get(keys::R2_BUCKET_NAME).unwrap(), "shop-assets");
}

#[tokio::test]
async fn test_api_fallback_finds_entry_without_create() {
    // CLI listing prints nothing usable; the HTTP API has the bucket
    let mock = MockProvider::new()
        .on("r2 bucket list", CommandOutput::success("Listing buckets...\n"))
        .on_api(
            "/accounts/acc123/r2/buckets",
            serde_json::json!({"success": true, "result": {"buckets": [{"name": "shop-assets"}]}}),
        );

    let config = config_with("CLOUDFLARE_API_TOKEN=cf-token\n");
    let outcome = reconciler(&mock)
        .get_or_create(ResourceKind::Bucket, "shop-assets", &config, false)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        GetOrCreate::Existing(launch_iac::RemoteResource::new("shop-assets", None))
    );
    assert!(mock.was_called("api /accounts/acc123/r2/buckets"));
    assert!(!mock.was_called("r2 bucket create"));
}

#[tokio::test]
async fn test_create_confirmed_by_response() {
    let created = format!(
        "✅ Successfully created DB 'shop-db'\n[[d1_databases]]\nbinding = \"DB\"\ndatabase_name = \"shop-db\"\ndatabase_id = \"{}\"\n",
        DB_ID
    );
    let mock = MockProvider::new()
        .on("d1 list", CommandOutput::success("[]"))
        .on("d1 create", CommandOutput::success(created));

    let outcome = reconciler(&mock)
        .get_or_create(ResourceKind::Database, "shop-db", &config(), false)
        .await
        .unwrap();

    let GetOrCreate::Created(resource) = outcome else {
        panic!("expected creation");
    };
    assert_eq!(resource.id.as_deref(), Some(DB_ID));
    assert!(!mock.was_called("d1 info"));
    assert_eq!(mock.count("d1 create"), 1);
}

#[tokio::test]
async fn test_create_confirmed_by_describe_then_listing() {
    // Unparseable create output, describe works
    let mock = MockProvider::new()
        .on("d1 list", CommandOutput::success("[]"))
        .on("d1 create", CommandOutput::success("done"))
        .on(
            "d1 info",
            CommandOutput::success(format!(r#"{{"uuid":"{}","name":"shop-db"}}"#, DB_ID)),
        );
    let outcome = reconciler(&mock)
        .get_or_create(ResourceKind::Database, "shop-db", &config(), false)
        .await
        .unwrap();
    assert!(matches!(outcome, GetOrCreate::Created(ref r) if r.id.as_deref() == Some(DB_ID)));

    // Describe fails too; the second listing sees the new bucket
    let mock = MockProvider::new()
        .on("r2 bucket list", CommandOutput::success(""))
        .on("r2 bucket list", CommandOutput::success("name: shop-assets\n"))
        .on("r2 bucket create", CommandOutput::success("queued"))
        .on("r2 bucket info", CommandOutput::failure(1, "not found"));
    let outcome = reconciler(&mock)
        .get_or_create(ResourceKind::Bucket, "shop-assets", &config(), false)
        .await
        .unwrap();
    assert!(matches!(outcome, GetOrCreate::Created(ref r) if r.name == "shop-assets"));
    assert_eq!(mock.count("r2 bucket list"), 2);
}

#[tokio::test]
async fn test_exhausted_confirmation_is_fatal() {
    let mock = MockProvider::new()
        .on("d1 list", CommandOutput::success("[]"))
        .on("d1 create", CommandOutput::failure(1, "quota exceeded"))
        .on("d1 info", CommandOutput::failure(1, "not found"));

    let err = reconciler(&mock)
        .get_or_create(ResourceKind::Database, "shop-db", &config(), false)
        .await
        .unwrap_err();

    match err {
        IacError::Reconciliation { resource, reason } => {
            assert!(resource.contains("shop-db"));
            assert!(reason.contains("quota exceeded"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_dry_run_reports_would_create_without_mutation() {
    let mock = MockProvider::new()
        .on("d1 list", CommandOutput::success("[]"))
        .on("r2 bucket list", CommandOutput::success("Listing buckets...\n"));

    let plan = Reconciler::build_plan(&config(), &Capabilities::full("ops@shop.dev"));
    let result = reconciler(&mock)
        .execute(&plan, &config(), ExecuteOptions::dry_run())
        .await
        .unwrap();

    assert!(!mock.any_mutating());
    assert!(!mock.was_called("d1 create"));
    assert!(!mock.was_called("r2 bucket create"));
    assert_eq!(result.outcome("d1").unwrap().action, ResourceAction::WouldCreate);
    assert_eq!(result.outcome("r2").unwrap().action, ResourceAction::WouldCreate);
    assert_eq!(result.outcome("worker").unwrap().action, ResourceAction::Unchanged);
    assert!(result.updates.is_empty());
}

#[tokio::test]
async fn test_deploy_dry_run_is_not_mutating() {
    let mock = MockProvider::new().on("deploy", CommandOutput::success("Total Upload: 12 KiB"));
    let out = reconciler(&mock).deploy(true).await.unwrap();
    assert!(out.stdout.contains("Total Upload"));
    assert!(mock.was_called("deploy --dry-run"));
    assert!(!mock.any_mutating());
}
