use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "labware-console")]
#[command(about = "Scan labware into a worklist and select slots on it")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "console.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Start with the worklist locked
    #[arg(long)]
    pub locked: bool,
}
