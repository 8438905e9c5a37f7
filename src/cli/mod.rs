pub mod commands;

use clap::Parser;

pub use commands::{Commands, NormalizeArgs};

/// Sentra — security report normalization
///
/// Ingests the loosely-schematized JSON produced by independent security
/// tools and reduces it to one canonical, de-duplicated, cross-correlated
/// finding set.
#[derive(Parser, Debug)]
#[command(
    name = "sentra",
    version,
    about = "Sentra — normalize heterogeneous security reports",
    long_about = "Sentra ingests raw security-tool output (static rule engines, secret\nscanners, dynamic test reporters, or unknown schemas) and produces one\ncanonical, de-duplicated, cross-correlated finding set."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}
