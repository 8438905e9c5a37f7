//! Sentra — report normalization for security dashboards.
//!
//! The core is a pure, synchronous transformation: it accepts one
//! already-parsed JSON document of variable shape and returns a
//! canonical [`Report`]. All I/O (fetching or reading the raw report)
//! belongs to the caller.
//!
//! Pipeline: tool adapters (accumulating across all that match) →
//! heuristic fallback when none matched → static coalescing → dynamic
//! evidence correlation → aggregation.

pub mod adapters;
pub mod cli;
pub mod coalesce;
pub mod config;
pub mod correlate;
pub mod engine;
pub mod export;
pub mod finding;
pub mod heuristic;
pub mod severity;

pub use adapters::{default_adapters, AdapterError, AdapterFindings, ToolAdapter};
pub use engine::{aggregate, normalize, normalize_with, NormalizeOptions};
pub use finding::{Counts, DynamicEvidence, Finding, FindingKind, Report, ReportMeta, TraceFrame};
pub use severity::{
    infer_cwe_from_text, infer_dynamic_severity, normalize_cwe, normalize_severity, Severity,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
