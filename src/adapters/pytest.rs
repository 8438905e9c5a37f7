use serde_json::Value;

use crate::adapters::fields::{as_line, first_line, locate_array, lossy_string};
use crate::adapters::{provenance, AdapterError, AdapterFindings, ToolAdapter};
use crate::finding::{Evidence, Finding, FindingKind};
use crate::severity::infer_dynamic_severity;

const ITEM_PATHS: &[&str] = &[
    "/dynamic/pytest/failures",
    "/pytest/failures",
    "/dynamic/pytest/items",
];

/// Fixed remediation text for runtime failures; the wording is lookup
/// data, not logic.
pub const DYNAMIC_RECOMMENDATION: &str =
    "Minimize the reproducing input and strengthen input validation and error handling.";

/// Adapter for the dynamic test-failure (pytest-style) section.
///
/// Failures carry a `nodeid`, a `message`, and a `traceback` list of
/// stack frames with `path`/`lineno`. File and line come from the first
/// traceback frame.
pub struct PytestAdapter;

impl ToolAdapter for PytestAdapter {
    fn name(&self) -> &'static str {
        "pytest"
    }

    fn extract(&self, raw: &Value) -> Result<Option<AdapterFindings>, AdapterError> {
        let Some((pointer, items)) = locate_array(raw, ITEM_PATHS) else {
            for section in ["/dynamic/pytest", "/pytest"] {
                if raw.pointer(section).is_some_and(Value::is_object) {
                    return Err(AdapterError::ShapeMismatch {
                        adapter: self.name(),
                        pointer: "/dynamic/pytest/failures",
                        detail: "section present but no failure array found".to_string(),
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
            findings.push(map_failure(item, idx));
        }

        Ok(Some(AdapterFindings {
            adapter: self.name(),
            consumed: provenance(raw, pointer),
            findings,
        }))
    }
}

fn map_failure(item: &Value, idx: usize) -> Finding {
    let nodeid = item
        .get("nodeid")
        .and_then(lossy_string)
        .unwrap_or_default();
    let message = item
        .get("message")
        .and_then(lossy_string)
        .unwrap_or_default();

    let first_frame = item
        .get("traceback")
        .and_then(Value::as_array)
        .and_then(|tb| tb.first());

    let file = first_frame
        .and_then(|f| f.get("path"))
        .and_then(lossy_string)
        .unwrap_or_default();
    let line = first_frame
        .and_then(|f| f.get("lineno"))
        .and_then(as_line)
        .or_else(|| first_line(item, &["lineno", "line"]))
        .unwrap_or(0);

    // Last "::"-delimited segment of the node id names the test.
    let test_name = nodeid
        .rsplit("::")
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("test");

    let id = if nodeid.is_empty() {
        format!("pytest:{idx}")
    } else {
        format!("pytest:{nodeid}")
    };

    let mut extra = std::collections::BTreeMap::new();
    extra.insert("message".to_string(), Value::from(message.clone()));
    extra.insert(
        "traceback".to_string(),
        item.get("traceback").cloned().unwrap_or(Value::Array(vec![])),
    );
    if let Some(tail) = item.get("stdout_tail").and_then(lossy_string) {
        extra.insert("stdout_tail".to_string(), Value::from(tail));
    }

    Finding {
        id,
        title: format!("Test failure: {test_name}"),
        severity: infer_dynamic_severity(&format!("{message} {nodeid}")),
        kind: FindingKind::Dynamic,
        file,
        line_start: line,
        line_end: line,
        cwe: String::new(),
        cvss: 0.0,
        recommendation: DYNAMIC_RECOMMENDATION.to_string(),
        tools: vec!["pytest".to_string()],
        rule_ids: if nodeid.is_empty() { vec![] } else { vec![nodeid] },
        extra,
        evidence: Evidence::default(),
    }
}
