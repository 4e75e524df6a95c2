//! Error types for dzsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use dzsync_core::{Cluster, CoreError, SyncDecision};
use dzsync_renderer::RenderError;

/// Every way a sync cycle can fail. All variants are fatal to the cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or transport failure while fetching the documentation page.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The documentation server answered with a non-2xx status.
    #[error("{url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// The response body could not be read as text.
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// No code block on the page contains an install command.
    #[error("no install pattern found in documentation ({package}=X.Y.Z-N)")]
    Parse { package: String },

    /// Fewer install examples than the cluster's position requires.
    #[error("no recommended version for cluster {cluster}: found {found} install example(s)")]
    ClusterNotFound { cluster: Cluster, found: usize },

    /// Cluster markers exist on the page but none binds the requested cluster.
    #[error("documentation marks recommended deployments for [{marked}] but not for cluster {cluster}")]
    AmbiguousLayout { cluster: Cluster, marked: String },

    /// A resolved or probed version string is not a semantic version.
    #[error("failed to parse version from '{text}': {source}")]
    VersionParse {
        text: String,
        #[source]
        source: CoreError,
    },

    #[error("failed to get validator identity: {reason}")]
    IdentityQuery { reason: String },

    #[error("validator identity {reported} does not match configured active ({active}) or passive ({passive}) identities")]
    UnknownIdentity {
        reported: String,
        active: String,
        passive: String,
    },

    #[error("sync not allowed when validator is active as {identity} (set validator.enabled_when_active=true to allow)")]
    ActiveIdentityBlocked { identity: String },

    #[error("target version {target} does not satisfy doublezero.version_constraint {constraint}")]
    ConstraintViolation { target: String, constraint: String },

    /// The installed-version probe could not run or produced no version.
    #[error("failed to get installed DoubleZero version from {bin}: {reason}")]
    Probe { bin: String, reason: String },

    #[error("command '{name}' failed: {reason}")]
    CommandExecution { name: String, reason: String },

    /// A command template failed to compile or render.
    #[error("template error: {0}")]
    Template(#[from] RenderError),

    /// Another instance holds the sync lock.
    #[error("another sync is running (lock held at {path})")]
    LockHeld { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A built-in pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl SyncError {
    /// The reportable decision for errors that represent a gate block.
    pub fn decision(&self) -> Option<SyncDecision> {
        match self {
            SyncError::UnknownIdentity { .. } | SyncError::ActiveIdentityBlocked { .. } => {
                Some(SyncDecision::BlockedByIdentity)
            }
            SyncError::ConstraintViolation { .. } => Some(SyncDecision::BlockedByConstraint),
            _ => None,
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
