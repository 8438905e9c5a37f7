//! Attaches dynamic (runtime) evidence to the best-matching static
//! finding.
//!
//! Matching is heuristic: prefer findings in the same application file
//! scored by line proximity plus CWE agreement, then fall back to a
//! global CWE-only scan. A successful attach bumps the static finding's
//! severity one step — runtime reproduction upgrades the threat.
//!
//! The correlator is a functional update: inputs are untouched, the
//! returned statics are annotated clones.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::finding::{norm_path, DynamicEvidence, Finding, TraceFrame};
use crate::severity::infer_cwe_from_text;

/// Path fragments that mark a traceback frame as library or test
/// scaffolding rather than application code.
pub const DEFAULT_NOISE_MARKERS: &[&str] = &[
    "site-packages",
    "dist-packages",
    "/usr/lib",
    "/usr/local/lib",
    ".venv/",
    "venv/lib",
    "node_modules/",
    ".tox/",
    "tests/",
    "/test/",
];

pub struct Correlated {
    /// Clones of the input statics, some carrying new dynamic evidence.
    pub attached_static: Vec<Finding>,
    /// Dynamic findings that matched nothing, emitted as-is.
    pub dynamic_orphans: Vec<Finding>,
}

pub fn correlate(
    statics: &[Finding],
    dynamics: &[Finding],
    noise_markers: &[String],
) -> Correlated {
    let mut attached: Vec<Finding> = statics.to_vec();

    // File path → indices into `attached`, each group line-sorted so
    // scoring (and therefore the first-max tie-break) is deterministic.
    let mut by_file: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, s) in attached.iter().enumerate() {
        by_file.entry(norm_path(&s.file)).or_default().push(i);
    }
    for indices in by_file.values_mut() {
        indices.sort_by_key(|&i| attached[i].line_start);
    }

    let mut orphans = Vec::new();

    for d in dynamics {
        let message = d
            .extra
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let dyn_cwe = infer_cwe_from_text(&format!("{} {}", d.title, message));
        let frames = traceback_frames(d);

        let mut best: Option<usize> = None;
        let mut best_score = 0u32;

        // (a) Same application file, scored by proximity + CWE.
        if let Some(app_path) = pick_app_path(&frames, noise_markers) {
            if let Some(indices) = by_file.get(&app_path) {
                for &i in indices {
                    let s = &attached[i];
                    let score = line_proximity(s.line_start, d.line_start)
                        + cwe_match(&s.cwe, &dyn_cwe);
                    if score > best_score {
                        best = Some(i);
                        best_score = score;
                    }
                }
            }
        }

        // (b) CWE-only backup across all statics.
        if best.is_none() && !dyn_cwe.is_empty() {
            for (i, s) in attached.iter().enumerate() {
                let score = cwe_match(&s.cwe, &dyn_cwe);
                if score > best_score {
                    best = Some(i);
                    best_score = score;
                }
            }
        }

        match best.filter(|_| best_score >= 1) {
            Some(i) => {
                let target = &mut attached[i];
                target.evidence.dynamic.push(DynamicEvidence {
                    test: d
                        .rule_ids
                        .first()
                        .cloned()
                        .unwrap_or_else(|| d.title.clone()),
                    message: message.to_string(),
                    traceback: frames,
                });
                // Runtime reproduction: one step up per attach event.
                target.severity = target.severity.bump();
                debug!(dynamic = %d.id, target = %target.id, score = best_score, "attached evidence");
            }
            None => orphans.push(d.clone()),
        }
    }

    Correlated {
        attached_static: attached,
        dynamic_orphans: orphans,
    }
}

/// Typed frames out of the opaque `extra.traceback` bag.
fn traceback_frames(d: &Finding) -> Vec<TraceFrame> {
    d.extra
        .get("traceback")
        .and_then(Value::as_array)
        .map(|frames| {
            frames
                .iter()
                .filter_map(|f| serde_json::from_value(f.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// First traceback frame that does not look like library or test
/// scaffolding. None when every frame is noise.
fn pick_app_path(frames: &[TraceFrame], noise_markers: &[String]) -> Option<String> {
    frames
        .iter()
        .map(|f| norm_path(&f.path))
        .find(|p| {
            !p.is_empty()
                && !DEFAULT_NOISE_MARKERS.iter().any(|m| p.contains(m))
                && !noise_markers.iter().any(|m| p.contains(m.as_str()))
        })
}

/// 2 within two lines, 1 within five, else 0.
fn line_proximity(a: u32, b: u32) -> u32 {
    let d = a.abs_diff(b);
    if d <= 2 {
        2
    } else if d <= 5 {
        1
    } else {
        0
    }
}

fn cwe_match(a: &str, b: &str) -> u32 {
    if !a.is_empty() && !b.is_empty() && a.eq_ignore_ascii_case(b) {
        1
    } else {
        0
    }
}
