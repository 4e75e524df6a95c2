use thiserror::Error;

/// Error surface for the scheduler and runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to start tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("sync error: {0}")]
    Sync(#[from] dzsync_sync::SyncError),

    #[error("invalid interval '{input}': {reason}")]
    InvalidInterval { input: String, reason: String },

    #[error("{task} task join failure: {reason}")]
    Join { task: &'static str, reason: String },
}
