use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use dzsync_core::{Config, Direction, SyncDecision};
use dzsync_daemon::{DaemonError, RunMode};
use dzsync_sync::{SyncOutcome, Syncer};

use crate::GlobalArgs;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Keep running and sync on UTC-aligned boundaries of this interval
    /// (e.g. 30s, 5m, 1h). Without it a single sync is performed.
    #[arg(long, value_name = "DURATION", value_parser = parse_interval_arg)]
    pub on_interval: Option<Duration>,

    /// Resolve and evaluate gates, render commands, but execute nothing.
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = Config::load(&global.config)
            .with_context(|| format!("failed to load config from {}", global.config.display()))?;

        let level = global.log_level.unwrap_or(config.log.level);
        dzsync_daemon::init_tracing(level, config.log.format);
        tracing::debug!(config = %config.file.display(), cluster = %config.cluster, "config loaded");

        let syncer = Syncer::from_config(&config).context("failed to initialise sync")?;
        let mode = match self.on_interval {
            Some(interval) => RunMode::OnInterval(interval),
            None => RunMode::Once,
        };

        match dzsync_daemon::start_blocking(syncer, mode, self.dry_run) {
            Ok(Some(outcome)) => {
                print_outcome(&outcome, self.dry_run);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(DaemonError::Sync(err)) => {
                if let Some(decision) = err.decision() {
                    eprintln!("{} {}", "✗".red().bold(), decision.to_string().red());
                }
                Err(anyhow::Error::new(err).context("sync failed"))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn parse_interval_arg(input: &str) -> Result<Duration, String> {
    dzsync_daemon::parse_interval(input).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_outcome(outcome: &SyncOutcome, dry_run: bool) {
    let prefix = if dry_run {
        format!("{} ", "[dry-run]".yellow())
    } else {
        String::new()
    };

    match outcome.decision {
        SyncDecision::NoChange => println!(
            "{prefix}{} {} already on {}",
            "✓".green().bold(),
            outcome.decision,
            outcome.package_version
        ),
        SyncDecision::NoCommandsConfigured => println!(
            "{prefix}{} {} {} required but no commands are configured",
            "!".yellow().bold(),
            outcome.decision.to_string().yellow(),
            outcome.diff
        ),
        _ => {
            let direction = match outcome.diff.direction() {
                Some(Direction::Upgrade) => "upgrade".green(),
                Some(Direction::Downgrade) => "downgrade".yellow(),
                Some(Direction::NoChange) | None => "install".cyan(),
            };
            println!(
                "{prefix}{} {} {direction} {} ({})",
                outcome.diff.direction_symbol(),
                outcome.decision,
                outcome.diff,
                outcome.package_version
            );
            if dry_run {
                println!("  no commands executed");
            } else {
                for name in &outcome.executed {
                    println!("  {} {name}", "✓".green());
                }
            }
        }
    }
}
