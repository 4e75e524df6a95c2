//! doublezero-version-sync: keeps the local DoubleZero client on the version
//! recommended for its cluster.
//!
//! # Usage
//!
//! ```text
//! doublezero-version-sync [-c <config>] [-l <level>] run [--on-interval <duration>] [--dry-run]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::run::RunArgs;
use dzsync_core::config::DEFAULT_CONFIG_PATH;
use dzsync_core::LogLevel;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "doublezero-version-sync",
    version,
    about = "Keep the DoubleZero client on the recommended version for its cluster",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(clap::Args, Debug)]
pub struct GlobalArgs {
    /// Path to the YAML config file.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override `log.level` from the config (debug, info, warn, error).
    #[arg(short = 'l', long, global = true)]
    pub log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare the installed version with the recommended one and sync if needed.
    Run(RunArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(&cli.global),
    }
}
