//! Declarative "first present field" lookup.
//!
//! Tool schemas drift: the same semantic slot (file path, line number,
//! severity) shows up under different names across tool versions. Each
//! slot is an ordered candidate list tried in order; one level of
//! nesting is expressed with a `/` (e.g. `location/path`).

use serde_json::Value;

/// File-path candidates shared by the heuristic parser.
pub const FILE_KEYS: &[&str] = &[
    "file",
    "path",
    "filename",
    "location/path",
    "location/file",
];

/// Line-number candidates.
pub const LINE_KEYS: &[&str] = &[
    "line",
    "line_number",
    "lineno",
    "start_line",
    "location/line",
];

/// End-of-range candidates.
pub const LINE_END_KEYS: &[&str] = &["end_line", "line"];

/// Severity candidates, loosest last.
pub const SEVERITY_KEYS: &[&str] = &[
    "severity",
    "issue_severity",
    "level",
    "priority",
    "risk",
    "impact",
    "cvss",
    "score",
];

/// Title candidates.
pub const TITLE_KEYS: &[&str] = &["title", "message", "issue_text", "name", "description"];

/// Rule/test identifier candidates.
pub const RULE_KEYS: &[&str] = &["rule_id", "check_id", "test_id", "id", "rule", "nodeid"];

/// CWE candidates.
pub const CWE_KEYS: &[&str] = &["cwe/id", "cwe", "cwe_id", "issue_cwe/id"];

/// Resolve a single candidate against an object, following at most one
/// `/`-separated nesting level.
fn resolve<'a>(obj: &'a Value, key: &str) -> Option<&'a Value> {
    match key.split_once('/') {
        Some((outer, inner)) => obj.get(outer)?.get(inner),
        None => obj.get(key),
    }
}

/// First candidate present and non-null, in table order.
pub fn first_present<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| resolve(obj, k))
        .find(|v| !v.is_null())
}

/// First candidate that yields a non-empty string.
pub fn first_string(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| resolve(obj, k))
        .filter_map(lossy_string)
        .find(|s| !s.is_empty())
}

/// First candidate that parses as a line number.
pub fn first_line(obj: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter().filter_map(|k| resolve(obj, k)).find_map(as_line)
}

/// Render a scalar as a string. Objects and arrays are not scalars.
pub fn lossy_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a non-negative line number from a JSON number or numeric string.
pub fn as_line(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().map(|x| x.min(u32::MAX as u64) as u32),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Locate the first of several JSON-pointer paths that holds an array.
/// Returns the pointer together with the array.
pub fn locate_array<'a>(
    root: &'a Value,
    pointers: &'static [&'static str],
) -> Option<(&'static str, &'a Vec<Value>)> {
    for p in pointers {
        if let Some(arr) = root.pointer(p).and_then(Value::as_array) {
            return Some((p, arr));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_candidates_resolve_one_level() {
        let obj = json!({"location": {"path": "src/a.py", "line": 14}});
        assert_eq!(first_string(&obj, FILE_KEYS).as_deref(), Some("src/a.py"));
        assert_eq!(first_line(&obj, LINE_KEYS), Some(14));
    }

    #[test]
    fn candidate_order_is_respected() {
        let obj = json!({"path": "b.py", "file": "a.py"});
        assert_eq!(first_string(&obj, FILE_KEYS).as_deref(), Some("a.py"));
    }

    #[test]
    fn numeric_strings_parse_as_lines() {
        let obj = json!({"line": "42"});
        assert_eq!(first_line(&obj, LINE_KEYS), Some(42));
    }

    #[test]
    fn null_and_missing_fields_are_skipped() {
        let obj = json!({"file": null, "filename": "c.py"});
        assert_eq!(first_string(&obj, FILE_KEYS).as_deref(), Some("c.py"));
        assert!(first_present(&json!({}), FILE_KEYS).is_none());
    }

    #[test]
    fn locate_array_walks_pointer_candidates() {
        let root = json!({"static": {"semgrep": {"items": [{"a": 1}]}}});
        let (ptr, arr) =
            locate_array(&root, &["/semgrep/items", "/static/semgrep/items"]).unwrap();
        assert_eq!(ptr, "/static/semgrep/items");
        assert_eq!(arr.len(), 1);
    }
}
