use serde_json::Value;

use crate::adapters::fields::{first_line, first_string, locate_array, lossy_string};
use crate::adapters::{provenance, AdapterError, AdapterFindings, ToolAdapter};
use crate::finding::{Evidence, Finding, FindingKind};
use crate::severity::{normalize_cwe, normalize_severity};

const ITEM_PATHS: &[&str] = &[
    "/static/bandit/items",
    "/bandit/items",
    "/static/bandit/results",
    "/bandit/results",
];

/// Adapter for the secret/credential scanner (bandit-style) section.
///
/// Items carry `rule_id` or `test_id`, `file`/`filename`/`path`,
/// `line`/`line_number`, and `severity`/`issue_severity`.
pub struct BanditAdapter;

impl ToolAdapter for BanditAdapter {
    fn name(&self) -> &'static str {
        "bandit"
    }

    fn extract(&self, raw: &Value) -> Result<Option<AdapterFindings>, AdapterError> {
        let Some((pointer, items)) = locate_array(raw, ITEM_PATHS) else {
            for section in ["/static/bandit", "/bandit"] {
                if raw.pointer(section).is_some_and(Value::is_object) {
                    return Err(AdapterError::ShapeMismatch {
                        adapter: self.name(),
                        pointer: "/static/bandit/items",
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
    let rule_id =
        first_string(item, &["rule_id", "test_id", "test_name"]).unwrap_or_default();
    let file = first_string(item, &["file", "filename", "path"]).unwrap_or_default();
    let line = first_line(item, &["line", "line_number"]).unwrap_or(0);

    let title = first_string(item, &["title", "issue_text"])
        .or_else(|| (!rule_id.is_empty()).then(|| rule_id.clone()))
        .unwrap_or_else(|| "Bandit finding".to_string());

    let id = if line > 0 {
        format!("bandit:{rule_id}:{file}:{line}")
    } else {
        format!("bandit:{rule_id}:{file}:{idx}")
    };

    let mut extra = std::collections::BTreeMap::new();
    if let Some(message) = first_string(item, &["message", "issue_text"]) {
        extra.insert("message".to_string(), Value::from(message));
    }
    if let Some(code) = item.get("code").and_then(lossy_string) {
        extra.insert("code".to_string(), Value::from(code));
    }

    Finding {
        id,
        title,
        severity: normalize_severity(
            item.get("severity").or_else(|| item.get("issue_severity")),
        ),
        kind: FindingKind::Static,
        file,
        line_start: line,
        line_end: line,
        cwe: normalize_cwe(
            item.pointer("/cwe/id")
                .or_else(|| item.pointer("/issue_cwe/id"))
                .or_else(|| item.get("cwe")),
        ),
        cvss: 0.0,
        recommendation: first_string(item, &["more_info", "remediation"]).unwrap_or_default(),
        tools: vec!["bandit".to_string()],
        rule_ids: if rule_id.is_empty() { vec![] } else { vec![rule_id] },
        extra,
        evidence: Evidence::default(),
    }
}
