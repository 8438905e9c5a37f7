//! End-to-end tests over the public API: a realistic unified report goes
//! in, the canonical de-duplicated report comes out.

use serde_json::json;

use sentra::{normalize, normalize_with, default_adapters, FindingKind, NormalizeOptions, Severity};

fn unified_report() -> serde_json::Value {
    json!({
        "meta": {
            "project": "webshop",
            "generated_at": "2026-08-20T09:30:00Z",
            "tools": ["semgrep", "bandit", "pytest"]
        },
        "static": {
            "semgrep": {
                "path": "reports/semgrep.json",
                "items": [
                    {
                        "rule_id": "python.sqlalchemy.sqli",
                        "file": "app/db.py",
                        "line": 40,
                        "end_line": 42,
                        "severity": "warning",
                        "cwe": {"id": 89},
                        "message": "Query built from user input",
                        "metadata": {"source-rule-url": "https://rules.example/sqli"}
                    },
                    {
                        "rule_id": "python.subprocess.shell",
                        "file": "app/run.py",
                        "line": 9,
                        "severity": "high",
                        "cwe": {"id": 78},
                        "message": "shell=True with tainted input"
                    }
                ]
            },
            "bandit": {
                "path": "reports/bandit.json",
                "items": [
                    {
                        "rule_id": "B608",
                        "file": "app/db.py",
                        "line": 41,
                        "severity": "medium",
                        "cwe": {"id": "89"},
                        "issue_text": "Possible SQL injection",
                        "more_info": "https://bandit.example/b608"
                    }
                ]
            }
        },
        "dynamic": {
            "pytest": {
                "path": "reports/pytest.json",
                "failures": [
                    {
                        "nodeid": "tests/test_db.py::test_sql_injection",
                        "message": "sqli reproduced with ' OR 1=1 --",
                        "traceback": [
                            {"path": "/usr/lib/python3.12/unittest/case.py", "lineno": 59},
                            {"path": "app/db.py", "lineno": 41}
                        ]
                    },
                    {
                        "nodeid": "tests/test_misc.py::test_unrelated",
                        "message": "flaky network timeout",
                        "traceback": [{"path": "app/net.py", "lineno": 77}]
                    }
                ]
            }
        }
    })
}

#[test]
fn full_pipeline_merges_correlates_and_counts() {
    let report = normalize(&unified_report());

    // semgrep+bandit SQL findings merged; shell finding distinct; one orphan.
    assert_eq!(report.counts.total, 3);
    assert_eq!(report.run_id, "webshop@2026-08-20T09:30:00Z");

    let sql = report
        .findings
        .iter()
        .find(|f| f.cwe == "CWE-89")
        .expect("merged SQL finding");
    assert_eq!(sql.kind, FindingKind::Static);
    assert_eq!(sql.line_start, 40);
    assert_eq!(sql.line_end, 42);
    assert_eq!(sql.tools, vec!["semgrep".to_string(), "bandit".to_string()]);
    // warning→Medium and medium→Medium merged, then bumped by the
    // runtime reproduction.
    assert_eq!(sql.severity, Severity::High);
    assert_eq!(sql.evidence.dynamic.len(), 1);
    assert_eq!(
        sql.evidence.dynamic[0].test,
        "tests/test_db.py::test_sql_injection"
    );
    // The library frame was skipped when locating the app frame, but the
    // attached traceback is preserved in full.
    assert_eq!(sql.evidence.dynamic[0].traceback.len(), 2);
    assert_eq!(
        sql.recommendation,
        "https://rules.example/sqli\nhttps://bandit.example/b608"
    );

    // Orphan dynamic finding survives as-is at the end.
    let orphan = report.findings.last().unwrap();
    assert_eq!(orphan.kind, FindingKind::Dynamic);
    assert_eq!(orphan.title, "Test failure: test_unrelated");

    // Counts are derived from the final list.
    assert_eq!(report.counts.by_type[&FindingKind::Static], 2);
    assert_eq!(report.counts.by_type[&FindingKind::Dynamic], 1);

    // Provenance records the declared source paths.
    assert_eq!(report.meta.originals["semgrep"], "reports/semgrep.json");
    assert_eq!(report.meta.originals["bandit"], "reports/bandit.json");
    assert_eq!(report.meta.originals["pytest"], "reports/pytest.json");
    assert!(report.meta.warnings.is_empty());
}

#[test]
fn report_round_trips_through_json() {
    let report = normalize(&unified_report());
    let text = serde_json::to_string(&report).unwrap();
    let back: sentra::Report = serde_json::from_str(&text).unwrap();
    assert_eq!(report, back);
}

#[test]
fn normalization_is_deterministic() {
    let raw = unified_report();
    assert_eq!(normalize(&raw), normalize(&raw));
}

#[test]
fn canonical_findings_do_not_merge_further() {
    let raw = unified_report();
    let first = normalize(&raw);

    // Feed the coalesced statics back through the coalescer.
    let statics: Vec<_> = first
        .findings
        .iter()
        .filter(|f| f.kind == FindingKind::Static)
        .cloned()
        .collect();
    let again = sentra::coalesce::coalesce(statics.clone());
    assert_eq!(again, statics);
}

#[test]
fn disabling_correlation_leaves_dynamics_as_orphans() {
    let opts = NormalizeOptions {
        correlate_dynamic: false,
        ..NormalizeOptions::default()
    };
    let report = normalize_with(&unified_report(), &opts, &default_adapters());
    assert_eq!(report.counts.by_type[&FindingKind::Dynamic], 2);
    assert!(report.findings.iter().all(|f| f.evidence.dynamic.is_empty()));
}

#[test]
fn unknown_schema_falls_back_to_heuristics() {
    let raw = json!({
        "tool": "mystery-scanner",
        "version": 3,
        "output": {
            "vulnerabilities": [
                {"title": "Hardcoded token", "location": {"path": "cfg.py", "line": 2}, "level": "critical"},
                {"nodeid": "suite::test_overflow", "message": "integer overflow", "stack": "..."}
            ]
        }
    });
    let report = normalize(&raw);
    assert_eq!(report.counts.total, 2);
    assert_eq!(report.counts.by_type[&FindingKind::Static], 1);
    assert_eq!(report.counts.by_type[&FindingKind::Dynamic], 1);
    assert_eq!(report.counts.by_severity[&Severity::Critical], 1);
}
