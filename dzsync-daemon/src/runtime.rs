use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};

use dzsync_sync::{SyncError, SyncOutcome, Syncer};

use crate::error::DaemonError;
use crate::schedule::{format_wait, next_boundary};

/// One blocking sync cycle.
pub type Cycle = Arc<dyn Fn() -> Result<SyncOutcome, SyncError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// A single cycle; its error is returned.
    Once,
    /// Cycles on UTC-aligned boundaries until Ctrl-C / SIGTERM.
    OnInterval(Duration),
}

/// Build a tokio runtime and run `syncer` in `mode`, blocking the current
/// thread. Returns the outcome in [`RunMode::Once`].
pub fn start_blocking(
    syncer: Syncer,
    mode: RunMode,
    dry_run: bool,
) -> Result<Option<SyncOutcome>, DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(DaemonError::Runtime)?;
    let syncer = Arc::new(syncer);

    runtime.block_on(async move {
        match mode {
            RunMode::Once => run_once(syncer, dry_run).await.map(Some),
            RunMode::OnInterval(interval) => {
                run_on_interval(syncer, interval, dry_run).await.map(|()| None)
            }
        }
    })
}

/// Run a single cycle on the blocking pool.
pub async fn run_once(syncer: Arc<Syncer>, dry_run: bool) -> Result<SyncOutcome, DaemonError> {
    tracing::info!(cluster = %syncer.cluster(), dry_run, "starting doublezero-version-sync (single run mode)");
    let outcome = tokio::task::spawn_blocking(move || syncer.sync_version(dry_run))
        .await
        .map_err(|err| DaemonError::Join {
            task: "sync",
            reason: err.to_string(),
        })??;
    Ok(outcome)
}

/// Run cycles on interval boundaries until a shutdown signal arrives.
/// Cycle failures are logged, never returned.
pub async fn run_on_interval(
    syncer: Arc<Syncer>,
    interval: Duration,
    dry_run: bool,
) -> Result<(), DaemonError> {
    tracing::info!(
        cluster = %syncer.cluster(),
        interval = %format_wait(interval),
        dry_run,
        "starting doublezero-version-sync (continuous mode)"
    );
    let cycle: Cycle = Arc::new(move || syncer.sync_version(dry_run));
    run_on_interval_until(cycle, interval, shutdown_signal()).await
}

/// The scheduling loop, driven by an arbitrary `cycle` and `shutdown` future.
///
/// Waits for the first boundary before the first cycle. Shutdown is only
/// observed between cycles.
pub async fn run_on_interval_until<S>(
    cycle: Cycle,
    interval: Duration,
    shutdown: S,
) -> Result<(), DaemonError>
where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let now = Utc::now();
    let first = next_boundary(now, interval);
    tracing::info!(
        wait = %format_wait(until(now, first)),
        next_sync = %first.to_rfc3339_opts(SecondsFormat::Secs, true),
        "waiting until next interval boundary"
    );

    loop {
        let now = Utc::now();
        let wait = until(now, next_boundary(now, interval));
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("received shutdown signal, stopping sync loop");
                return Ok(());
            }
            _ = tokio::time::sleep(wait) => {}
        }

        tracing::info!("running sync");
        let run = Arc::clone(&cycle);
        let result = tokio::task::spawn_blocking(move || run())
            .await
            .map_err(|err| DaemonError::Join {
                task: "sync",
                reason: err.to_string(),
            })?;

        let now = Utc::now();
        let next = next_boundary(now, interval);
        let wait = format_wait(until(now, next));
        let at = next.to_rfc3339_opts(SecondsFormat::Secs, true);
        match result {
            Ok(outcome) => tracing::info!(
                decision = %outcome.decision,
                diff = %outcome.diff,
                "sync succeeded - next sync in {wait} at {at}"
            ),
            Err(err) => tracing::error!(
                error = %err,
                decision = ?err.decision(),
                "sync failed - next sync in {wait} at {at}"
            ),
        }
    }
}

fn until(now: chrono::DateTime<Utc>, then: chrono::DateTime<Utc>) -> Duration {
    (then - now).to_std().unwrap_or(Duration::ZERO)
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "ctrl-c handler failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler failed");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
