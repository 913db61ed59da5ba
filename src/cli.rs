use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_URL;

/// Top-level CLI entry point for the workstation provisioner.
#[derive(Parser, Debug)]
#[command(
    name = "workstation",
    about = "Install a security-analyst toolset through the native package managers",
    version = env!("WORKSTATION_VERSION")
)]
pub struct Cli {
    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Path to the tool manifest
    #[arg(long = "config", value_name = "PATH", default_value = "tools.json")]
    pub config: PathBuf,

    /// Manifest URL used when the local file is missing
    #[arg(
        long = "config-url",
        value_name = "URL",
        env = "WORKSTATION_CONFIG_URL",
        default_value = DEFAULT_CONFIG_URL
    )]
    pub config_url: String,

    /// Log file (defaults to the user cache directory)
    #[arg(long = "log", value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Extra attempts for each failed install
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub retries: u32,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
