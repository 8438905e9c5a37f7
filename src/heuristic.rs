//! Best-effort extraction for reports no adapter recognizes.
//!
//! The raw JSON tree is walked recursively; every array whose elements
//! are plain objects is treated as a candidate finding collection, and
//! each object is mapped through the shared field-candidate tables.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::adapters::fields::{
    first_line, first_present, first_string, CWE_KEYS, FILE_KEYS, LINE_END_KEYS, LINE_KEYS,
    RULE_KEYS, SEVERITY_KEYS, TITLE_KEYS,
};
use crate::finding::{Evidence, Finding, FindingKind};
use crate::severity::{normalize_cwe, normalize_severity};

const GENERIC_TITLE: &str = "Unlabeled finding";

/// Fields whose mere presence marks an object as a runtime observation.
const DYNAMIC_MARKERS: &[&str] = &["nodeid", "traceback", "stack", "exception"];

/// Parse arbitrary nested JSON into findings. Returns an empty vector
/// when nothing object-shaped can be found; never fails.
pub fn heuristic_parse(raw: &Value) -> Vec<Finding> {
    let mut collections = Vec::new();
    collect_object_arrays(raw, String::new(), &mut collections);

    debug!(collections = collections.len(), "heuristic candidate collections");

    let mut seen = HashSet::new();
    let mut findings = Vec::new();
    for (path, items) in collections {
        for item in items {
            let finding = map_object(item, &path);
            // The same raw object can be reachable through several nested
            // paths; the constructed id collapses those duplicates.
            if seen.insert(finding.id.clone()) {
                findings.push(finding);
            }
        }
    }
    findings
}

/// Recursively gather every array whose elements are all plain objects,
/// tagged with its structural path for provenance.
fn collect_object_arrays<'a>(
    node: &'a Value,
    path: String,
    out: &mut Vec<(String, Vec<&'a Value>)>,
) {
    match node {
        Value::Array(items) => {
            if !items.is_empty() && items.iter().all(Value::is_object) {
                out.push((path.clone(), items.iter().collect()));
            }
            for (i, item) in items.iter().enumerate() {
                collect_object_arrays(item, format!("{path}/{i}"), out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                collect_object_arrays(v, format!("{path}/{k}"), out);
            }
        }
        _ => {}
    }
}

fn map_object(item: &Value, source_path: &str) -> Finding {
    let file = first_string(item, FILE_KEYS).unwrap_or_default();
    let line = first_line(item, LINE_KEYS).unwrap_or(0);
    let line_end = first_line(item, LINE_END_KEYS).unwrap_or(line).max(line);
    let rule_id = first_string(item, RULE_KEYS).unwrap_or_default();
    let title = first_string(item, TITLE_KEYS).unwrap_or_else(|| GENERIC_TITLE.to_string());

    let kind = classify(item, &rule_id, &title);

    let id = if file.is_empty() && line == 0 && rule_id.is_empty() && title == GENERIC_TITLE {
        format!("heuristic:{}", Finding::content_hash(item))
    } else {
        let discriminator = if rule_id.is_empty() { title.as_str() } else { rule_id.as_str() };
        format!("heuristic:{file}:{line}:{discriminator}")
    };

    let mut extra = std::collections::BTreeMap::new();
    extra.insert("sourcePath".to_string(), Value::from(source_path));
    if let Some(message) = item.get("message").and_then(|v| v.as_str()) {
        extra.insert("message".to_string(), Value::from(message));
    }
    if let Some(tb) = item.get("traceback") {
        extra.insert("traceback".to_string(), tb.clone());
    }

    Finding {
        id,
        title,
        severity: normalize_severity(first_present(item, SEVERITY_KEYS)),
        kind,
        file,
        line_start: line,
        line_end,
        cwe: normalize_cwe(first_present(item, CWE_KEYS)),
        cvss: 0.0,
        recommendation: String::new(),
        tools: vec!["heuristic".to_string()],
        rule_ids: if rule_id.is_empty() { vec![] } else { vec![rule_id] },
        extra,
        evidence: Evidence::default(),
    }
}

/// Stack-trace-like fields or a test-looking identifier mean DYNAMIC.
fn classify(item: &Value, rule_id: &str, title: &str) -> FindingKind {
    if DYNAMIC_MARKERS.iter().any(|k| item.get(k).is_some()) {
        return FindingKind::Dynamic;
    }
    if looks_like_test(rule_id) || looks_like_test(title) {
        return FindingKind::Dynamic;
    }
    FindingKind::Static
}

fn looks_like_test(s: &str) -> bool {
    let t = s.to_lowercase();
    t.contains("::") || t.starts_with("test_") || t.contains("pytest")
}
