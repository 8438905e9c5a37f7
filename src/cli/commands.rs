use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize a raw unified report into the canonical finding set
    Normalize(NormalizeArgs),

    /// Initialize a .sentra.toml config file in the current directory
    Init,
}

#[derive(clap::Args, Debug)]
pub struct NormalizeArgs {
    /// Path to the raw report JSON file
    pub input: PathBuf,

    /// Output format: "terminal", "json" or "csv"
    #[arg(short, long, default_value = "terminal")]
    pub format: String,

    /// Write the rendered report to a file
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Do not merge redundant static findings
    #[arg(long)]
    pub no_merge: bool,

    /// Do not attach dynamic evidence to static findings
    #[arg(long)]
    pub no_correlate: bool,

    /// Fail (exit code 1) if findings at or above this severity remain.
    /// Values: CRITICAL, HIGH, MEDIUM, LOW
    #[arg(long)]
    pub fail_on: Option<String>,

    /// Ignore any .sentra.toml found near the input file
    #[arg(long)]
    pub no_config: bool,
}
