use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// Severity level of a finding. Ordinal: Low < Medium < High < Critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "HIGH" => Severity::High,
            "MEDIUM" => Severity::Medium,
            _ => Severity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    /// One ordinal step up, saturating at Critical. Used when runtime
    /// evidence confirms a static finding.
    pub fn bump(self) -> Self {
        match self {
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map an arbitrary severity representation (string, number, or absent)
/// to the canonical enum. Never fails; unrecognized input is Low.
pub fn normalize_severity(raw: Option<&Value>) -> Severity {
    let Some(raw) = raw else {
        return Severity::Low;
    };

    if let Some(n) = raw.as_f64() {
        return severity_from_score(n);
    }

    let text = match raw {
        Value::String(s) => s.trim().to_lowercase(),
        _ => return Severity::Low,
    };

    match text.as_str() {
        "critical" | "cri" => Severity::Critical,
        "high" | "hi" => Severity::High,
        "medium" | "med" | "mid" => Severity::Medium,
        // A tool's "warning" level means actionable, not cosmetic.
        "warning" | "warn" => Severity::Medium,
        "info" | "informational" => Severity::Low,
        "low" | "lo" => Severity::Low,
        _ => match text.parse::<f64>() {
            Ok(n) => severity_from_score(n),
            Err(_) => Severity::Low,
        },
    }
}

/// CVSS-like 0-10 scale.
fn severity_from_score(n: f64) -> Severity {
    if n >= 9.0 {
        Severity::Critical
    } else if n >= 7.0 {
        Severity::High
    } else if n >= 4.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn cwe_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)CWE-\d+").unwrap())
}

/// Normalize a CWE identifier to "CWE-<digits>".
///
/// Accepts bare numbers, embedded mentions inside arbitrary text, and
/// already-normalized identifiers in any case. Unrecognized non-empty
/// input passes through untouched; absent input yields "".
pub fn normalize_cwe(raw: Option<&Value>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let text = match raw {
        Value::Null => return String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return String::new(),
    };

    if text.is_empty() {
        return String::new();
    }
    if let Some(m) = cwe_pattern().find(&text) {
        return m.as_str().to_uppercase();
    }
    if text.chars().all(|c| c.is_ascii_digit()) {
        return format!("CWE-{}", text);
    }
    text
}

fn dynamic_severity_rules() -> &'static [(Regex, Severity)] {
    static RULES: OnceLock<Vec<(Regex, Severity)>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            (Regex::new(r"sql.?inj|sqli").unwrap(), Severity::High),
            (Regex::new(r"command.?inj|os.?command").unwrap(), Severity::High),
            (Regex::new(r"xxe|deserialization|rce").unwrap(), Severity::High),
            (
                Regex::new(r"race.?condition|overflow|dos|assert|leak").unwrap(),
                Severity::Medium,
            ),
        ]
    })
}

fn cwe_keyword_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            (Regex::new(r"sql.?inj|sqli").unwrap(), "CWE-89"),
            (Regex::new(r"command.?inj|os.?command").unwrap(), "CWE-78"),
            (Regex::new(r"path.?traversal").unwrap(), "CWE-22"),
            (Regex::new(r"\bxxe\b").unwrap(), "CWE-611"),
            (Regex::new(r"\bxss\b|cross.?site").unwrap(), "CWE-79"),
            (Regex::new(r"csrf").unwrap(), "CWE-352"),
        ]
    })
}

/// Infer a severity for a dynamic (runtime) finding from free text,
/// typically the failure message plus the test identifier. First
/// matching keyword class wins.
pub fn infer_dynamic_severity(text: &str) -> Severity {
    let t = text.to_lowercase();
    for (pattern, severity) in dynamic_severity_rules() {
        if pattern.is_match(&t) {
            return *severity;
        }
    }
    Severity::Low
}

/// Infer a CWE from free text. First matching keyword class wins;
/// no match yields an empty string.
pub fn infer_cwe_from_text(text: &str) -> String {
    let t = text.to_lowercase();
    for (pattern, cwe) in cwe_keyword_rules() {
        if pattern.is_match(&t) {
            return (*cwe).to_string();
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_vocabularies_map_to_canonical_levels() {
        assert_eq!(normalize_severity(Some(&json!("warning"))), Severity::Medium);
        assert_eq!(normalize_severity(Some(&json!("WARN"))), Severity::Medium);
        assert_eq!(normalize_severity(Some(&json!("info"))), Severity::Low);
        assert_eq!(normalize_severity(Some(&json!("informational"))), Severity::Low);
        assert_eq!(normalize_severity(Some(&json!("CRITICAL"))), Severity::Critical);
        assert_eq!(normalize_severity(Some(&json!("hi"))), Severity::High);
        assert_eq!(normalize_severity(Some(&json!("med"))), Severity::Medium);
    }

    #[test]
    fn numeric_scores_follow_cvss_bands() {
        assert_eq!(normalize_severity(Some(&json!(9.5))), Severity::Critical);
        assert_eq!(normalize_severity(Some(&json!(7))), Severity::High);
        assert_eq!(normalize_severity(Some(&json!(3))), Severity::Low);
        assert_eq!(normalize_severity(Some(&json!("8.1"))), Severity::High);
    }

    #[test]
    fn unrecognized_input_defaults_to_low() {
        assert_eq!(normalize_severity(Some(&json!("zzz"))), Severity::Low);
        assert_eq!(normalize_severity(Some(&json!(null))), Severity::Low);
        assert_eq!(normalize_severity(None), Severity::Low);
        assert_eq!(normalize_severity(Some(&json!({"level": 9}))), Severity::Low);
    }

    #[test]
    fn cwe_forms_normalize_to_one_shape() {
        assert_eq!(normalize_cwe(Some(&json!("89"))), "CWE-89");
        assert_eq!(normalize_cwe(Some(&json!(89))), "CWE-89");
        assert_eq!(normalize_cwe(Some(&json!("CWE-89"))), "CWE-89");
        assert_eq!(normalize_cwe(Some(&json!("cwe-89"))), "CWE-89");
        assert_eq!(
            normalize_cwe(Some(&json!(
                "Improper Neutralization of Special Elements (CWE-89)"
            ))),
            "CWE-89"
        );
    }

    #[test]
    fn cwe_passthrough_and_empty() {
        assert_eq!(normalize_cwe(Some(&json!("not-a-cwe"))), "not-a-cwe");
        assert_eq!(normalize_cwe(Some(&json!(""))), "");
        assert_eq!(normalize_cwe(Some(&json!(null))), "");
        assert_eq!(normalize_cwe(None), "");
    }

    #[test]
    fn dynamic_severity_keywords() {
        assert_eq!(infer_dynamic_severity("sqli detected in login"), Severity::High);
        assert_eq!(infer_dynamic_severity("os command injection"), Severity::High);
        assert_eq!(infer_dynamic_severity("buffer overflow on parse"), Severity::Medium);
        assert_eq!(infer_dynamic_severity("assert failed"), Severity::Medium);
        assert_eq!(infer_dynamic_severity("flaky timeout"), Severity::Low);
    }

    #[test]
    fn cwe_inference_priority() {
        assert_eq!(infer_cwe_from_text("SQL Injection via query param"), "CWE-89");
        assert_eq!(infer_cwe_from_text("command injection in shell"), "CWE-78");
        assert_eq!(infer_cwe_from_text("path traversal ../.."), "CWE-22");
        assert_eq!(infer_cwe_from_text("XXE entity expansion"), "CWE-611");
        assert_eq!(infer_cwe_from_text("reflected xss"), "CWE-79");
        assert_eq!(infer_cwe_from_text("csrf token missing"), "CWE-352");
        assert_eq!(infer_cwe_from_text("nothing interesting"), "");
    }

    #[test]
    fn bump_saturates_at_critical() {
        assert_eq!(Severity::Low.bump(), Severity::Medium);
        assert_eq!(Severity::Medium.bump(), Severity::High);
        assert_eq!(Severity::High.bump(), Severity::Critical);
        assert_eq!(Severity::Critical.bump(), Severity::Critical);
    }
}
