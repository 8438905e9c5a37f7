use serde_json::Value;

use crate::adapters::fields::{as_line, first_line, first_string, locate_array, lossy_string};
use crate::adapters::{provenance, AdapterError, AdapterFindings, ToolAdapter};
use crate::finding::{Evidence, Finding, FindingKind};
use crate::severity::{normalize_cwe, normalize_severity};

/// Known locations of the semgrep item array across report revisions.
const ITEM_PATHS: &[&str] = &[
    "/static/semgrep/items",
    "/semgrep/items",
    "/static/semgrep/results",
    "/semgrep/results",
];

/// Adapter for the static rule engine (semgrep-style) section.
///
/// Items carry `rule_id`, `file`/`line`/`end_line`, `severity`, a nested
/// `cwe.id`, and a `metadata` object with optional reference URLs.
pub struct SemgrepAdapter;

impl ToolAdapter for SemgrepAdapter {
    fn name(&self) -> &'static str {
        "semgrep"
    }

    fn extract(&self, raw: &Value) -> Result<Option<AdapterFindings>, AdapterError> {
        let Some((pointer, items)) = locate_array(raw, ITEM_PATHS) else {
            // A semgrep section without any item array is recognized but
            // malformed; that failure stays inside this adapter.
            for section in ["/static/semgrep", "/semgrep"] {
                if raw.pointer(section).is_some_and(Value::is_object) {
                    return Err(AdapterError::ShapeMismatch {
                        adapter: self.name(),
                        pointer: "/static/semgrep/items",
                        detail: "section present but no item array found".to_string(),
                    });
                }
            }
            return Ok(None);
        };

        let mut findings = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if !item.is_object() {
                continue;
            }
            findings.push(map_item(item, idx));
        }

        Ok(Some(AdapterFindings {
            adapter: self.name(),
            consumed: provenance(raw, pointer),
            findings,
        }))
    }
}

fn map_item(item: &Value, idx: usize) -> Finding {
    let rule_id = first_string(item, &["rule_id", "check_id", "id"]).unwrap_or_default();
    let file = first_string(item, &["file", "path", "location/path"]).unwrap_or_default();
    let line = first_line(item, &["line", "start_line", "location/line"]).unwrap_or(0);
    let line_end = first_line(item, &["end_line", "line"]).unwrap_or(line);

    let title = first_string(item, &["title", "message"])
        .or_else(|| (!rule_id.is_empty()).then(|| rule_id.clone()))
        .unwrap_or_else(|| "Semgrep finding".to_string());

    let id = if line > 0 {
        format!("semgrep:{rule_id}:{file}:{line}")
    } else {
        format!("semgrep:{rule_id}:{file}:{idx}")
    };

    let mut extra = std::collections::BTreeMap::new();
    if let Some(owasp) = item.pointer("/metadata/owasp") {
        extra.insert("owasp".to_string(), owasp.clone());
    }
    if let Some(column) = item.get("column").and_then(as_line) {
        extra.insert("column".to_string(), Value::from(column));
    }
    if let Some(message) = item.get("message").and_then(lossy_string) {
        extra.insert("message".to_string(), Value::from(message));
    }

    Finding {
        id,
        title,
        severity: normalize_severity(item.get("severity")),
        kind: FindingKind::Static,
        file,
        line_start: line,
        line_end: line_end.max(line),
        cwe: normalize_cwe(
            item.pointer("/cwe/id")
                .or_else(|| item.get("cwe"))
                .or_else(|| item.get("cwe_id")),
        ),
        cvss: 0.0,
        recommendation: pick_recommendation(item),
        tools: vec!["semgrep".to_string()],
        rule_ids: if rule_id.is_empty() { vec![] } else { vec![rule_id] },
        extra,
        evidence: Evidence::default(),
    }
}

/// First available of: source-rule-url, first reference URL, shortlink.
fn pick_recommendation(item: &Value) -> String {
    if let Some(url) = item
        .pointer("/metadata/source-rule-url")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return url.to_string();
    }
    if let Some(first) = item
        .pointer("/metadata/references")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .and_then(Value::as_str)
    {
        return first.to_string();
    }
    item.pointer("/metadata/shortlink")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
