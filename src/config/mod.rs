pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// Invoked without arguments the launcher reads `launcher.toml` when present
/// and otherwise runs with built-in defaults.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "dash-launcher")]
#[command(about = "Prepare the working directory and start the training dashboard")]
pub struct LauncherArgs {
    /// Path to TOML configuration file (default: launcher.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show the resolved launch plan without installing or starting anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}
