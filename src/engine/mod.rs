//! The normalization pipeline. Orchestrates adapters, the heuristic
//! fallback, coalescing, correlation, and final aggregation.
//!
//! The core is synchronous and pure: it accepts an already-parsed JSON
//! value, performs no I/O, and returns a `Report` value. Malformed
//! content never fails the call — the worst case is an empty report
//! with warnings in `meta`.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::adapters::{self, ToolAdapter};
use crate::coalesce::coalesce;
use crate::correlate::correlate;
use crate::finding::{Counts, Finding, FindingKind, Report, ReportMeta};
use crate::heuristic::heuristic_parse;

/// Warning recorded when neither adapters nor the heuristic fallback
/// produced anything.
pub const NO_FINDINGS_WARNING: &str = "no findings recognized";

/// Options controlling the pipeline. Defaults run the full pipeline.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Merge redundant static findings. Default true.
    pub merge_static: bool,
    /// Attach runtime evidence to static findings. Default true.
    pub correlate_dynamic: bool,
    /// Extra path fragments treated as non-application traceback frames,
    /// on top of the built-in markers.
    pub noise_paths: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            merge_static: true,
            correlate_dynamic: true,
            noise_paths: Vec::new(),
        }
    }
}

/// Normalize a raw report with the default adapter set and options.
pub fn normalize(raw: &Value) -> Report {
    normalize_with(raw, &NormalizeOptions::default(), &adapters::default_adapters())
}

/// Normalize a raw report with an explicit adapter list and options.
///
/// The adapter list is ordered: findings accumulate in list order, and
/// the heuristic fallback runs only when every adapter came up empty.
pub fn normalize_with(
    raw: &Value,
    opts: &NormalizeOptions,
    adapter_list: &[Box<dyn ToolAdapter>],
) -> Report {
    if is_empty_input(raw) {
        debug!("empty or null input, returning empty report");
        return empty_report("input report was empty or null");
    }

    // 1) Flatten the raw document into canonical findings.
    let mut run = adapters::run_adapters(raw, adapter_list);

    if run.findings.is_empty() {
        info!("no adapter matched, trying heuristic fallback");
        run.findings = heuristic_parse(raw);
        if run.findings.is_empty() {
            run.warnings.push(NO_FINDINGS_WARNING.to_string());
        } else {
            run.originals
                .insert("heuristic".to_string(), "(recursive scan)".to_string());
        }
    }

    // 2) Split by detection method, coalesce statics, attach evidence.
    let (statics, dynamics): (Vec<Finding>, Vec<Finding>) = run
        .findings
        .into_iter()
        .partition(|f| f.kind == FindingKind::Static);

    let merged = if opts.merge_static {
        coalesce(statics)
    } else {
        statics
    };

    let (attached, orphans) = if opts.correlate_dynamic {
        let out = correlate(&merged, &dynamics, &opts.noise_paths);
        (out.attached_static, out.dynamic_orphans)
    } else {
        (merged, dynamics)
    };

    let mut findings = attached;
    findings.extend(orphans);

    // 3) Aggregate and assemble.
    let counts = aggregate(&findings);
    info!(
        total = counts.total,
        static_count = findings.iter().filter(|f| f.kind == FindingKind::Static).count(),
        "normalization complete"
    );

    Report {
        run_id: run_id(raw),
        counts,
        findings,
        meta: ReportMeta {
            project: meta_string(raw, "project"),
            tools: meta_tools(raw),
            generated_at: meta_string(raw, "generated_at"),
            originals: run.originals,
            warnings: run.warnings,
        },
    }
}

/// Single linear pass over the final finding list.
pub fn aggregate(findings: &[Finding]) -> Counts {
    let mut counts = Counts {
        total: findings.len(),
        ..Counts::default()
    };
    for f in findings {
        *counts.by_severity.entry(f.severity).or_insert(0) += 1;
        *counts.by_type.entry(f.kind).or_insert(0) += 1;
    }
    counts
}

/// `{project-or-default}@{generatedAt-or-current-time}`.
fn run_id(raw: &Value) -> String {
    let project = meta_string(raw, "project").unwrap_or_else(|| "project".to_string());
    let stamp = meta_string(raw, "generated_at")
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
    format!("{project}@{stamp}")
}

fn is_empty_input(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn empty_report(reason: &str) -> Report {
    warn!(reason, "empty report");
    Report {
        run_id: "unknown".to_string(),
        counts: Counts::default(),
        findings: Vec::new(),
        meta: ReportMeta {
            warnings: vec![reason.to_string()],
            ..ReportMeta::default()
        },
    }
}

fn meta_string(raw: &Value, key: &str) -> Option<String> {
    let v = raw.pointer(&format!("/meta/{key}"))?;
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn meta_tools(raw: &Value) -> Vec<String> {
    raw.pointer("/meta/tools")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;
    use serde_json::json;

    #[test]
    fn null_input_yields_an_empty_report_with_a_reason() {
        let report = normalize(&Value::Null);
        assert_eq!(report.counts.total, 0);
        assert_eq!(report.findings.len(), 0);
        assert_eq!(report.run_id, "unknown");
        assert!(!report.meta.warnings.is_empty());
    }

    #[test]
    fn unrecognizable_content_reports_a_warning_instead_of_failing() {
        let report = normalize(&json!({"nothing": {"to": ["see", "here"]}}));
        assert_eq!(report.counts.total, 0);
        assert!(report
            .meta
            .warnings
            .iter()
            .any(|w| w == NO_FINDINGS_WARNING));
    }

    #[test]
    fn end_to_end_static_plus_dynamic_correlation() {
        let raw = json!({
            "static": {"semgrep": {"items": [
                {"rule_id": "r1", "file": "a.js", "line": 10, "severity": "high", "cwe": {"id": 89}}
            ]}},
            "dynamic": {"pytest": {"failures": [
                {"nodeid": "t::sql", "message": "sqli detected",
                 "traceback": [{"path": "a.js", "lineno": 11}]}
            ]}}
        });
        let report = normalize(&raw);

        assert_eq!(report.counts.total, 1);
        let f = &report.findings[0];
        assert_eq!(f.kind, FindingKind::Static);
        assert_eq!(f.cwe, "CWE-89");
        assert_eq!(f.severity, Severity::Critical); // High bumped by runtime evidence
        assert_eq!(f.evidence.dynamic.len(), 1);
        assert_eq!(report.counts.by_type.get(&FindingKind::Dynamic), None);
        assert_eq!(report.counts.by_severity[&Severity::Critical], 1);
    }

    #[test]
    fn toggles_disable_merge_and_correlation() {
        let raw = json!({
            "static": {"semgrep": {"items": [
                {"rule_id": "r1", "file": "a.js", "line": 10, "severity": "high", "cwe": {"id": 89}},
                {"rule_id": "r2", "file": "a.js", "line": 11, "severity": "low", "cwe": {"id": 89}}
            ]}},
            "dynamic": {"pytest": {"failures": [
                {"nodeid": "t::sql", "message": "sqli detected",
                 "traceback": [{"path": "a.js", "lineno": 11}]}
            ]}}
        });
        let opts = NormalizeOptions {
            merge_static: false,
            correlate_dynamic: false,
            noise_paths: Vec::new(),
        };
        let report = normalize_with(&raw, &opts, &crate::adapters::default_adapters());
        assert_eq!(report.counts.total, 3);
        assert_eq!(report.counts.by_type[&FindingKind::Dynamic], 1);
        assert!(report.findings.iter().all(|f| f.evidence.dynamic.is_empty()));
    }

    #[test]
    fn run_id_uses_declared_meta_and_falls_back_to_now() {
        let raw = json!({
            "meta": {"project": "shop", "generated_at": "2026-08-01T10:00:00Z", "tools": ["semgrep"]},
            "static": {"semgrep": {"items": []}}
        });
        let report = normalize(&raw);
        assert_eq!(report.run_id, "shop@2026-08-01T10:00:00Z");
        assert_eq!(report.meta.tools, vec!["semgrep".to_string()]);

        let no_meta = normalize(&json!({"static": {"semgrep": {"items": []}}}));
        assert!(no_meta.run_id.starts_with("project@"));
    }

    #[test]
    fn adapter_failure_is_recorded_and_others_still_run() {
        let raw = json!({
            "static": {
                "semgrep": {"items": "broken"},
                "bandit": {"items": [{"rule_id": "B1", "file": "x.py", "line": 2, "severity": "low"}]}
            }
        });
        let report = normalize(&raw);
        assert_eq!(report.counts.total, 1);
        assert!(report.meta.warnings.iter().any(|w| w.contains("semgrep")));
    }

    #[test]
    fn heuristic_fallback_kicks_in_when_no_adapter_matches() {
        let raw = json!({"custom_tool": {"issues": [
            {"name": "thing", "path": "lib/a.rb", "line": 12, "risk": "high"}
        ]}});
        let report = normalize(&raw);
        assert_eq!(report.counts.total, 1);
        assert_eq!(report.findings[0].severity, Severity::High);
        assert_eq!(report.meta.originals["heuristic"], "(recursive scan)");
    }

    #[test]
    fn dynamic_orphans_survive_to_the_final_list() {
        let raw = json!({
            "static": {"semgrep": {"items": [
                {"rule_id": "r1", "file": "a.js", "line": 10, "severity": "low"}
            ]}},
            "dynamic": {"pytest": {"failures": [
                {"nodeid": "t::test_unrelated", "message": "flaky timeout",
                 "traceback": [{"path": "zzz.js", "lineno": 999}]}
            ]}}
        });
        let report = normalize(&raw);
        assert_eq!(report.counts.total, 2);
        assert_eq!(report.counts.by_type[&FindingKind::Dynamic], 1);
        // Statics come first, orphans after.
        assert_eq!(report.findings[0].kind, FindingKind::Static);
        assert_eq!(report.findings[1].kind, FindingKind::Dynamic);
    }

    #[test]
    fn aggregate_is_a_pure_tally() {
        let report = normalize(&json!({
            "static": {"semgrep": {"items": [
                {"rule_id": "a", "file": "1.js", "line": 1, "severity": "critical"},
                {"rule_id": "b", "file": "2.js", "line": 1, "severity": "low"}
            ]}}
        }));
        assert_eq!(report.counts.total, 2);
        assert_eq!(report.counts.by_severity[&Severity::Critical], 1);
        assert_eq!(report.counts.by_severity[&Severity::Low], 1);
        assert_eq!(aggregate(&report.findings), report.counts);
    }
}
