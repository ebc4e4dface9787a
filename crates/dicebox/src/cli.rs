//! Command-line interface for the `dicebox-auth` binary.

use std::path::PathBuf;

use clap::Parser;

/// Command line arguments. Every flag except `--config` overrides a value
/// from the configuration file.
#[derive(Debug, Clone, Parser)]
#[command(name = "dicebox-auth", version, about = "Dicebox authentication and session service")]
pub struct CliArgs {
    /// Configuration file path (created with defaults if missing)
    #[arg(short, long, value_name = "FILE", default_value = "dicebox.toml")]
    pub config: PathBuf,

    /// Bind address (e.g., 127.0.0.1:40001)
    #[arg(short, long, value_name = "ADDRESS")]
    pub bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,
}
