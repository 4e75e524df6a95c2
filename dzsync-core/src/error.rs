//! Error types for dzsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while parsing versions, constraints and cluster names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The text is not a `major.minor.patch[-meta]` version.
    #[error("invalid version '{input}': {reason}")]
    VersionParse { input: String, reason: String },

    /// A comparator in a version constraint could not be parsed.
    #[error("invalid version constraint '{constraint}': {reason}")]
    ConstraintParse { constraint: String, reason: String },

    /// Cluster name outside the supported set.
    #[error("invalid cluster name '{0}' - must be one of mainnet-beta, testnet")]
    UnknownCluster(String),
}

/// All errors that can arise while loading and validating the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file did not exist at the expected path.
    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    /// Underlying I/O failure, annotated with the path being read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, including serde_yaml's key path and line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A value parsed but failed validation.
    #[error("invalid {key}: {reason}")]
    Invalid { key: String, reason: String },

    /// A validator identity keypair file could not be turned into a public key.
    #[error("failed to load {key} keypair from {path}: {reason}")]
    Keypair {
        key: String,
        path: PathBuf,
        reason: String,
    },

    /// `dirs::home_dir()` returned `None`, so `~/` cannot be expanded.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
