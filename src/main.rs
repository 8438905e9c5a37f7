use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sentra::cli::{Cli, Commands, NormalizeArgs};
use sentra::config::{self, SentraConfig};
use sentra::export;
use sentra::{normalize_with, default_adapters, NormalizeOptions, Severity};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("sentra=debug")
    } else if cli.quiet {
        EnvFilter::new("sentra=error")
    } else {
        EnvFilter::new("sentra=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match &cli.command {
        Commands::Normalize(args) => run_normalize(args),
        Commands::Init => config::init_config(),
    }
}

fn run_normalize(args: &NormalizeArgs) -> Result<()> {
    // I/O happens here, before the core is invoked; the core itself only
    // ever sees the parsed value.
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing {} as JSON", args.input.display()))?;

    let mut opts = if args.no_config {
        NormalizeOptions::default()
    } else {
        args.input
            .parent()
            .and_then(SentraConfig::load)
            .map(|c| c.to_options())
            .unwrap_or_default()
    };
    if args.no_merge {
        opts.merge_static = false;
    }
    if args.no_correlate {
        opts.correlate_dynamic = false;
    }

    let report = normalize_with(&raw, &opts, &default_adapters());
    info!(run_id = %report.run_id, total = report.counts.total, "normalized");

    match args.format.as_str() {
        "json" => {
            let output = export::json::render(&report)?;
            write_or_print(args, &output)?;
        }
        "csv" => {
            let output = export::csv::render(&report);
            write_or_print(args, &output)?;
        }
        _ => {
            export::terminal::render(&report);
            if let Some(ref path) = args.out {
                let json_output = export::json::render(&report)?;
                std::fs::write(path, &json_output)?;
                info!("JSON report also written to {}", path.display());
            }
        }
    }

    // Exit code based on findings
    if let Some(ref fail_on) = args.fail_on {
        let threshold = Severity::from_str(fail_on);
        if report.has_findings_at_or_above(threshold) {
            std::process::exit(1);
        }
    }

    Ok(())
}

fn write_or_print(args: &NormalizeArgs, output: &str) -> Result<()> {
    if let Some(ref path) = args.out {
        std::fs::write(path, output)?;
        info!("Report written to {}", path.display());
    } else {
        println!("{}", output);
    }
    Ok(())
}
