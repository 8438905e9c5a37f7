use owo_colors::OwoColorize;

use crate::finding::{FindingKind, Report};
use crate::severity::Severity;

/// Render a normalized report to the terminal with colors.
pub fn render(report: &Report) {
    println!();
    println!(
        "{}  {} — {} findings",
        "📋".bold(),
        report.run_id.bold(),
        report.counts.total
    );
    println!();

    if report.findings.is_empty() {
        println!("  {}  No findings in this report.", "✅".bold());
        for w in &report.meta.warnings {
            println!("  {} {}", "⚠".yellow(), w.dimmed());
        }
        println!();
        return;
    }

    for finding in &report.findings {
        let severity_display = format!(" {} ", finding.severity);
        let severity_colored = match finding.severity {
            Severity::Critical => severity_display.on_red().white().bold().to_string(),
            Severity::High => severity_display.on_yellow().black().bold().to_string(),
            Severity::Medium => severity_display.on_blue().white().bold().to_string(),
            Severity::Low => severity_display.on_white().black().to_string(),
        };

        let location = if finding.file.is_empty() {
            "(unknown file)".to_string()
        } else if finding.line_start > 0 {
            format!("{}:{}", finding.file, finding.line_start)
        } else {
            finding.file.clone()
        };

        println!("  {}  {}", severity_colored, location.dimmed());
        println!("           {}", finding.title.bold());

        if !finding.cwe.is_empty() {
            println!("           {}", finding.cwe.dimmed());
        }

        if finding.kind == FindingKind::Static && !finding.evidence.dynamic.is_empty() {
            println!(
                "           {} reproduced at runtime by {} test(s)",
                "⚡".yellow(),
                finding.evidence.dynamic.len()
            );
        }

        if !finding.recommendation.is_empty() {
            for line in finding.recommendation.lines().take(2) {
                println!("           {} {}", "⮕".green(), line.green());
            }
        }
        println!();
    }

    // Summary bar
    println!("{}", "━".repeat(60));

    let mut summary_parts = Vec::new();
    for (severity, count) in report.counts.by_severity.iter().rev() {
        let part = format!("{} {}", count, severity.as_str().to_lowercase());
        let colored = match severity {
            Severity::Critical => part.red().bold().to_string(),
            Severity::High => part.yellow().bold().to_string(),
            Severity::Medium => part.blue().to_string(),
            Severity::Low => part.white().to_string(),
        };
        summary_parts.push(colored);
    }

    println!(
        " {} findings: {}",
        report.counts.total.to_string().bold(),
        summary_parts.join(", ")
    );

    for w in &report.meta.warnings {
        println!(" {} {}", "⚠".yellow(), w.dimmed());
    }

    println!("{}", "━".repeat(60));
    println!();
}
