use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::severity::Severity;

/// Detection method of a finding, distinct from its vulnerability category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FindingKind {
    Static,
    Dynamic,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::Static => "STATIC",
            FindingKind::Dynamic => "DYNAMIC",
        }
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One stack frame from a runtime traceback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub lineno: u32,
}

/// A single runtime observation attached to a static finding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicEvidence {
    pub test: String,
    pub message: String,
    #[serde(default)]
    pub traceback: Vec<TraceFrame>,
}

/// Evidence container. Only `dynamic` exists today; keeping the wrapper
/// lets new evidence channels land without reshaping every Finding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub dynamic: Vec<DynamicEvidence>,
}

/// The canonical normalized finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Deterministic identity derived from tool + rule + file + line,
    /// or a content hash when those are all absent.
    pub id: String,

    /// Short human-readable label; never empty.
    pub title: String,

    pub severity: Severity,

    /// "STATIC" or "DYNAMIC".
    #[serde(rename = "type")]
    pub kind: FindingKind,

    /// Forward-slash relative path; empty when unknown.
    pub file: String,

    /// 1-based line numbers; 0 when unknown.
    pub line_start: u32,
    pub line_end: u32,

    /// Normalized "CWE-<digits>" form, or empty.
    pub cwe: String,

    /// Numeric score, 0 when unknown. Severity is the authoritative rank.
    pub cvss: f64,

    /// Free text, may be multi-line, may be empty.
    pub recommendation: String,

    /// Contributing tool names. Non-empty after coalescing, no duplicates.
    pub tools: Vec<String>,

    /// Contributing rule/test identifiers, may be empty.
    pub rule_ids: Vec<String>,

    /// Tool-specific context preserved for display, never used as a
    /// merge or correlation key.
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,

    #[serde(default)]
    pub evidence: Evidence,
}

impl Finding {
    /// Content-hash fallback for IDs when no tool/rule/file/line identity
    /// is available. Same Sha256 → 8-hex-char scheme used everywhere.
    pub fn content_hash(value: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.to_string().as_bytes());
        let hex = format!("{:x}", hasher.finalize());
        hex[..8].to_string()
    }
}

/// Summary counts, fully derived from the final finding list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub total: usize,
    #[serde(default)]
    pub by_severity: BTreeMap<Severity, usize>,
    #[serde(default)]
    pub by_type: BTreeMap<FindingKind, usize>,
}

/// Provenance carried alongside the findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Tool names the raw report declared about itself.
    #[serde(default)]
    pub tools: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,

    /// Adapter name → source path (or JSON pointer) it consumed.
    #[serde(default)]
    pub originals: BTreeMap<String, String>,

    /// Non-fatal diagnostics accumulated during normalization.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// The canonical report. Constructed once per normalization call and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub run_id: String,
    pub counts: Counts,
    pub findings: Vec<Finding>,
    pub meta: ReportMeta,
}

impl Report {
    /// Check if there are findings at or above a severity threshold.
    pub fn has_findings_at_or_above(&self, threshold: Severity) -> bool {
        self.findings.iter().any(|f| f.severity >= threshold)
    }
}

/// Normalize a path to forward slashes.
pub fn norm_path(p: &str) -> String {
    p.replace('\\', "/")
}
