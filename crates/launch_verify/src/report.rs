//! Verification reports and their on-disk artifacts.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{VerifyError, VerifyResult};
use crate::external::ExternalChecks;
use crate::probe::ProbeResult;

pub const REPORT_JSON: &str = "report.json";
pub const CHECKS_JSON: &str = "checks.json";
pub const REPORT_MD: &str = "report.md";

/// How much a run checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMode {
    /// HTTP probes plus database and secrets checks.
    #[default]
    Full,
    /// HTTP probes only.
    Minimal,
}

impl VerifyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyMode::Full => "full",
            VerifyMode::Minimal => "minimal",
        }
    }
}

impl std::fmt::Display for VerifyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerifyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(VerifyMode::Full),
            "minimal" => Ok(VerifyMode::Minimal),
            other => Err(format!("unknown mode '{}' (expected full or minimal)", other)),
        }
    }
}

/// Result of one verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub generated_at: DateTime<Utc>,
    pub base_url: String,
    pub mode: VerifyMode,
    pub checks: Vec<ProbeResult>,
    pub external_checks: ExternalChecks,
    pub ok: bool,
    /// Full response bodies keyed by artifact file name.
    #[serde(skip)]
    pub attachments: BTreeMap<String, String>,
}

impl VerificationReport {
    pub fn new(
        base_url: impl Into<String>,
        mode: VerifyMode,
        checks: Vec<ProbeResult>,
        external_checks: ExternalChecks,
    ) -> Self {
        let ok = Self::is_ok(mode, &checks, &external_checks);
        Self {
            generated_at: Utc::now(),
            base_url: base_url.into(),
            mode,
            checks,
            external_checks,
            ok,
            attachments: BTreeMap::new(),
        }
    }

    /// Every probe passed, and in full mode both external checks are ok.
    pub fn is_ok(mode: VerifyMode, checks: &[ProbeResult], external: &ExternalChecks) -> bool {
        checks.iter().all(|c| c.passed) && (mode == VerifyMode::Minimal || external.all_ok())
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &ProbeResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// Human-readable summary.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# Smoke report");
        let _ = writeln!(md);
        let _ = writeln!(md, "- Result: **{}**", if self.ok { "PASS" } else { "FAIL" });
        let _ = writeln!(md, "- Base URL: {}", self.base_url);
        let _ = writeln!(md, "- Mode: {}", self.mode);
        let _ = writeln!(md, "- Generated: {}", self.generated_at.to_rfc3339());
        let _ = writeln!(md);
        let _ = writeln!(md, "## HTTP checks");
        let _ = writeln!(md);
        let _ = writeln!(md, "| | Check | URL | Expected | Status | Attempts | Note |");
        let _ = writeln!(md, "|---|---|---|---|---|---|---|");
        for check in &self.checks {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} | {} | {} | {} |",
                if check.passed { "✅" } else { "❌" },
                check.name,
                check.url,
                check.expected,
                check
                    .status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                check.attempts_used,
                check.note.as_deref().unwrap_or("").replace('|', "\\|"),
            );
        }
        let _ = writeln!(md);
        let _ = writeln!(md, "## External checks");
        let _ = writeln!(md);
        for (name, check) in [
            ("database", &self.external_checks.database),
            ("secrets", &self.external_checks.secrets),
        ] {
            let _ = writeln!(md, "- {}: **{}** {}", name, check.status, check.message);
        }
        if !self.attachments.is_empty() {
            let _ = writeln!(md);
            let _ = writeln!(md, "## Artifacts");
            let _ = writeln!(md);
            for name in self.attachments.keys() {
                let _ = writeln!(md, "- [{}]({})", name, name);
            }
        }
        md
    }
}

/// Writes report artifacts.
pub struct ReportWriter;

impl ReportWriter {
    /// `<project>/artifacts/smoke/<UTC timestamp>`
    pub fn artifact_dir(project_dir: &Path, at: &DateTime<Utc>) -> PathBuf {
        project_dir
            .join("artifacts")
            .join("smoke")
            .join(at.format("%Y%m%dT%H%M%SZ").to_string())
    }

    /// Write `report.json`, `checks.json`, `report.md` and any attachments
    /// into `dir`. Returns the written paths.
    pub fn write(dir: &Path, report: &VerificationReport) -> VerifyResult<Vec<PathBuf>> {
        fs::create_dir_all(dir).map_err(|source| VerifyError::Artifact {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = vec![
            (REPORT_JSON.to_string(), serde_json::to_string_pretty(report)?),
            (CHECKS_JSON.to_string(), serde_json::to_string_pretty(&report.checks)?),
            (REPORT_MD.to_string(), report.to_markdown()),
        ];
        files.extend(
            report
                .attachments
                .iter()
                .map(|(name, body)| (name.clone(), body.clone())),
        );

        let mut written = Vec::with_capacity(files.len());
        for (name, content) in files {
            let path = dir.join(&name);
            fs::write(&path, content).map_err(|source| VerifyError::Artifact {
                path: path.clone(),
                source,
            })?;
            written.push(path);
        }

        info!("Wrote {} artifact(s) to {:?}", written.len(), dir);
        Ok(written)
    }
}
