//! Flat CSV export.
//!
//! Every finding must flatten to scalar columns so the download path
//! needs no special-casing: sets join with `|`, dynamic evidence is
//! reduced to a count.

use serde::Serialize;

use crate::finding::{Finding, Report};

/// One CSV row. Field order is the column order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatFinding {
    pub id: String,
    pub title: String,
    pub severity: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub file: String,
    pub line_start: u32,
    pub line_end: u32,
    pub cwe: String,
    pub cvss: f64,
    pub recommendation: String,
    pub tools: String,
    pub rule_ids: String,
    pub dynamic_evidence: usize,
}

pub fn flatten(f: &Finding) -> FlatFinding {
    FlatFinding {
        id: f.id.clone(),
        title: f.title.clone(),
        severity: f.severity.to_string(),
        kind: f.kind.to_string(),
        file: f.file.clone(),
        line_start: f.line_start,
        line_end: f.line_end,
        cwe: f.cwe.clone(),
        cvss: f.cvss,
        recommendation: f.recommendation.clone(),
        tools: f.tools.join("|"),
        rule_ids: f.rule_ids.join("|"),
        dynamic_evidence: f.evidence.dynamic.len(),
    }
}

const HEADERS: &[&str] = &[
    "id",
    "title",
    "severity",
    "type",
    "file",
    "lineStart",
    "lineEnd",
    "cwe",
    "cvss",
    "recommendation",
    "tools",
    "ruleIds",
    "dynamicEvidence",
];

/// Render the whole report's findings as CSV with a header row.
pub fn render(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&HEADERS.join(","));
    out.push('\n');
    for f in &report.findings {
        let row = flatten(f);
        let cells = [
            row.id,
            row.title,
            row.severity,
            row.kind,
            row.file,
            row.line_start.to_string(),
            row.line_end.to_string(),
            row.cwe,
            row.cvss.to_string(),
            row.recommendation,
            row.tools,
            row.rule_ids,
            row.dynamic_evidence.to_string(),
        ];
        let quoted: Vec<String> = cells.iter().map(|c| quote(c)).collect();
        out.push_str(&quoted.join(","));
        out.push('\n');
    }
    out
}

/// Standard CSV quoting: wrap in quotes, double embedded quotes.
fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}
