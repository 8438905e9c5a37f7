//! Merges static findings that describe the same underlying defect.
//!
//! Tools frequently report one defect several times: the same rule at
//! adjacent lines, or two tools flagging the same CWE in the same file.
//! Findings group by file + signature (CWE, else first rule id, else a
//! title prefix) — deliberately ignoring the exact line — and then merge
//! within a group when their start lines are at most two apart.

use std::collections::HashMap;

use tracing::debug;

use crate::finding::{norm_path, Finding};

/// Maximum title prefix used as a grouping signature.
const TITLE_SIGNATURE_LEN: usize = 48;

/// Start lines within this distance merge into one finding.
const MATE_LINE_TOLERANCE: u32 = 2;

/// Coalesce static findings. Input order drives both merge order and
/// output order: groups appear in first-seen order, distinct mates
/// within a group likewise. Mate search is first-fit, not best-fit.
pub fn coalesce(items: Vec<Finding>) -> Vec<Finding> {
    let input_len = items.len();

    // Group index by key, groups themselves ordered by first sighting.
    let mut key_index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<Finding>> = Vec::new();

    for f in items {
        let key = group_key(&f);
        let gi = *key_index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        let group = &mut groups[gi];

        match group
            .iter_mut()
            .find(|g| close_lines(f.line_start, g.line_start))
        {
            Some(mate) => merge_into(mate, f),
            None => group.push(f),
        }
    }

    let merged: Vec<Finding> = groups.into_iter().flatten().collect();
    if merged.len() < input_len {
        debug!(before = input_len, after = merged.len(), "coalesced static findings");
    }
    merged
}

/// file + uppercased signature; the signature is the CWE when present,
/// else the first rule id, else a truncated title prefix.
fn group_key(f: &Finding) -> String {
    let signature = if !f.cwe.is_empty() {
        f.cwe.clone()
    } else if let Some(rule) = f.rule_ids.first() {
        rule.clone()
    } else {
        f.title.chars().take(TITLE_SIGNATURE_LEN).collect()
    };
    format!("{}|{}", norm_path(&f.file), signature.to_uppercase())
}

fn close_lines(a: u32, b: u32) -> bool {
    a.abs_diff(b) <= MATE_LINE_TOLERANCE
}

/// Fold `incoming` into `mate`. Severity and cvss take the max, line
/// range widens to cover both, sets union, recommendations concatenate
/// line-deduplicated. The mate keeps its id.
fn merge_into(mate: &mut Finding, incoming: Finding) {
    mate.severity = mate.severity.max(incoming.severity);
    mate.cvss = mate.cvss.max(incoming.cvss);
    mate.line_start = mate.line_start.min(incoming.line_start);
    mate.line_end = mate.line_end.max(incoming.line_end);

    for tool in incoming.tools {
        if !mate.tools.contains(&tool) {
            mate.tools.push(tool);
        }
    }
    for rule in incoming.rule_ids {
        if !mate.rule_ids.contains(&rule) {
            mate.rule_ids.push(rule);
        }
    }
    mate.recommendation = join_unique_lines(&mate.recommendation, &incoming.recommendation);
}

/// Split both texts on newlines, trim, drop empties, dedupe preserving
/// first-seen order, rejoin.
fn join_unique_lines(a: &str, b: &str) -> String {
    let mut seen = Vec::new();
    for line in a.lines().chain(b.lines()) {
        let line = line.trim();
        if !line.is_empty() && !seen.iter().any(|s| s == line) {
            seen.push(line.to_string());
        }
    }
    seen.join("\n")
}
