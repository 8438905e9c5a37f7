pub mod bandit;
pub mod fields;
pub mod pytest;
pub mod semgrep;

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::finding::Finding;

/// Failure local to one adapter. The orchestrator logs it and moves on;
/// it never aborts the other adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{adapter}: recognized section at {pointer} has unexpected shape: {detail}")]
    ShapeMismatch {
        adapter: &'static str,
        pointer: &'static str,
        detail: String,
    },
}

/// What one adapter extracted from the raw report.
#[derive(Debug, Clone)]
pub struct AdapterFindings {
    /// Adapter name, e.g. "semgrep".
    pub adapter: &'static str,
    /// Source path of the original tool output when the report declares
    /// one, otherwise the JSON pointer the adapter consumed.
    pub consumed: String,
    pub findings: Vec<Finding>,
}

/// One pluggable extraction function per known tool schema.
///
/// `extract` returns `Ok(None)` when the adapter does not recognize the
/// input shape at all. Adapters are defensive about per-item garbage
/// (missing fields degrade to defaults); an `Err` means the recognized
/// section itself was malformed.
pub trait ToolAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, raw: &Value) -> Result<Option<AdapterFindings>, AdapterError>;
}

/// The built-in adapter set, in fixed order. Callers wanting a different
/// set pass their own list to `normalize_with`.
pub fn default_adapters() -> Vec<Box<dyn ToolAdapter>> {
    vec![
        Box::new(semgrep::SemgrepAdapter),
        Box::new(bandit::BanditAdapter),
        Box::new(pytest::PytestAdapter),
    ]
}

/// Outcome of running every adapter over one raw report.
#[derive(Debug, Default)]
pub struct AdapterRun {
    pub findings: Vec<Finding>,
    /// Adapter name → consumed source path / pointer.
    pub originals: BTreeMap<String, String>,
    pub warnings: Vec<String>,
}

/// Run all adapters and accumulate their findings in adapter order.
///
/// Adapters are independent of one another, so they are evaluated in
/// parallel; the ordered collect keeps output identical to a serial run.
pub fn run_adapters(raw: &Value, adapters: &[Box<dyn ToolAdapter>]) -> AdapterRun {
    let results: Vec<(
        &'static str,
        Result<Option<AdapterFindings>, AdapterError>,
    )> = adapters
        .par_iter()
        .map(|a| (a.name(), a.extract(raw)))
        .collect();

    let mut run = AdapterRun::default();
    for (name, result) in results {
        match result {
            Ok(Some(out)) => {
                debug!(adapter = name, count = out.findings.len(), "adapter matched");
                run.originals.insert(name.to_string(), out.consumed);
                run.findings.extend(out.findings);
            }
            Ok(None) => {
                debug!(adapter = name, "adapter did not recognize input");
            }
            Err(e) => {
                warn!(adapter = name, "adapter failed, skipping: {e}");
                run.warnings.push(format!("adapter {name} failed: {e}"));
            }
        }
    }
    run
}

/// Source-path provenance: prefer the sibling `path` field the unified
/// report records next to each tool section, else the consumed pointer.
pub(crate) fn provenance(raw: &Value, pointer: &'static str) -> String {
    let parent = pointer.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
    raw.pointer(parent)
        .and_then(|v| v.get("path"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| pointer.to_string())
}
