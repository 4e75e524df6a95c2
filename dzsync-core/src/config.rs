//! YAML configuration.
//!
//! # File layout
//!
//! ```yaml
//! log:        { level: info, format: text }
//! cluster:    { name: mainnet-beta }
//! doublezero: { bin: doublezero, version_constraint: ">= 0.6.9, < 0.8.0" }
//! validator:
//!   rpc_url: http://127.0.0.1:8899
//!   enabled_when_active: false
//!   identities: { active: ./active.json, passive: ./passive.json }
//! sync:
//!   commands:
//!     - name: install
//!       cmd: apt-get
//!       args: ["install", "-y", "doublezero={{ PackageVersionTo }}"]
//! ```
//!
//! # API pattern
//!
//! [`Config::load_at`] takes an explicit home directory (used for `~/`
//! expansion) so tests never depend on `$HOME`; [`Config::load`] derives it
//! from `dirs::home_dir()`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constraint::VersionConstraint;
use crate::error::{io_err, ConfigError};
use crate::keys::{pubkey_from_keypair_file, IdentityKeys};
use crate::types::Cluster;

/// Config path used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "~/doublezero-version-sync/config.yaml";

/// Probe binary used when `doublezero.bin` is not set.
pub const DEFAULT_BIN: &str = "doublezero";

/// Documentation page listing the recommended package per cluster.
pub const DEFAULT_DOCS_URL: &str =
    "https://docs.malbeclabs.com/setup/#1-install-doublezero-packages";

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!(
                "unknown log level '{other}'; expected: debug, info, warn, error"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// One step run, in declared order, when a version change is required.
///
/// `cmd`, every entry of `args` and every value of `environment` are Tera
/// templates rendered with the command template data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub name: String,
    pub cmd: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Log a warning and continue with the next command on failure.
    #[serde(default)]
    pub allow_failure: bool,
    /// Inherit stdout/stderr instead of capturing them.
    #[serde(default)]
    pub stream_output: bool,
    #[serde(default)]
    pub disabled: bool,
}

// ---------------------------------------------------------------------------
// On-disk shape
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    log: LogConfig,
    cluster: ClusterSection,
    doublezero: DoubleZeroSection,
    validator: ValidatorSection,
    sync: SyncSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ClusterSection {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DoubleZeroSection {
    bin: Option<String>,
    version_constraint: Option<String>,
    docs_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ValidatorSection {
    rpc_url: Option<String>,
    enabled_when_active: bool,
    identities: IdentitiesSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct IdentitiesSection {
    active: Option<String>,
    passive: Option<String>,
    active_pubkey: Option<String>,
    passive_pubkey: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SyncSection {
    lock_file: Option<String>,
    commands: Vec<CommandSpec>,
}

// ---------------------------------------------------------------------------
// Validated config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DoubleZeroConfig {
    /// Command name or absolute path of the probe binary.
    pub bin: String,
    pub version_constraint: Option<VersionConstraint>,
    pub docs_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    pub rpc_url: String,
    pub enabled_when_active: bool,
    pub identities: IdentityKeys,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncConfig {
    pub lock_file: Option<PathBuf>,
    pub commands: Vec<CommandSpec>,
}

/// Loaded and validated configuration. Read-only after load.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute path of the file this config was loaded from.
    pub file: PathBuf,
    pub log: LogConfig,
    pub cluster: Cluster,
    pub doublezero: DoubleZeroConfig,
    /// `None` when no validator RPC URL is configured; the identity gate is
    /// then not applicable.
    pub validator: Option<ValidatorConfig>,
    pub sync: SyncConfig,
}

impl Config {
    /// Load `path` using `dirs::home_dir()` for `~/` expansion.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        Config::load_at(dirs::home_dir().as_deref(), path)
    }

    /// Load and validate `path`. Relative paths inside the file resolve
    /// against the file's directory.
    pub fn load_at(home: Option<&Path>, path: &Path) -> Result<Config, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| io_err(path, e))?;
        let file = resolve_path_at(home, &path.to_string_lossy(), &cwd)?;
        if !file.exists() {
            return Err(ConfigError::NotFound { path: file });
        }
        let contents = std::fs::read_to_string(&file).map_err(|e| io_err(&file, e))?;
        Config::from_yaml_at(home, &file, &contents)
    }

    /// Validate already-read YAML as if it were loaded from `file`.
    pub fn from_yaml_at(
        home: Option<&Path>,
        file: &Path,
        contents: &str,
    ) -> Result<Config, ConfigError> {
        let raw: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
                path: file.to_path_buf(),
                source,
            })?
        };
        let base_dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let cluster = raw
            .cluster
            .name
            .parse::<Cluster>()
            .map_err(|e| ConfigError::invalid("cluster.name", e.to_string()))?;

        let doublezero = validate_doublezero(home, &base_dir, raw.doublezero)?;
        let validator = validate_validator(home, &base_dir, raw.validator)?;
        let sync = validate_sync(home, &base_dir, raw.sync)?;

        Ok(Config {
            file: file.to_path_buf(),
            log: raw.log,
            cluster,
            doublezero,
            validator,
            sync,
        })
    }
}

fn validate_doublezero(
    home: Option<&Path>,
    base_dir: &Path,
    section: DoubleZeroSection,
) -> Result<DoubleZeroConfig, ConfigError> {
    let bin = match section.bin.filter(|b| !b.trim().is_empty()) {
        None => DEFAULT_BIN.to_string(),
        Some(bin) if is_file_path(&bin) => resolve_path_at(home, &bin, base_dir)?
            .to_string_lossy()
            .into_owned(),
        Some(bin) => bin,
    };

    let version_constraint = match section.version_constraint.filter(|c| !c.trim().is_empty()) {
        None => None,
        Some(raw) => Some(
            VersionConstraint::parse(&raw)
                .map_err(|e| ConfigError::invalid("doublezero.version_constraint", e.to_string()))?,
        ),
    };

    let docs_url = section
        .docs_url
        .unwrap_or_else(|| DEFAULT_DOCS_URL.to_string());
    validate_http_url("doublezero.docs_url", &docs_url)?;

    Ok(DoubleZeroConfig {
        bin,
        version_constraint,
        docs_url,
    })
}

fn validate_validator(
    home: Option<&Path>,
    base_dir: &Path,
    section: ValidatorSection,
) -> Result<Option<ValidatorConfig>, ConfigError> {
    let Some(rpc_url) = section.rpc_url.filter(|u| !u.trim().is_empty()) else {
        return Ok(None);
    };
    validate_http_url("validator.rpc_url", &rpc_url)?;

    let ids = section.identities;
    let active = identity_key(
        home,
        base_dir,
        "validator.identities.active",
        ids.active,
        ids.active_pubkey,
    )?;
    let passive = identity_key(
        home,
        base_dir,
        "validator.identities.passive",
        ids.passive,
        ids.passive_pubkey,
    )?;

    Ok(Some(ValidatorConfig {
        rpc_url,
        enabled_when_active: section.enabled_when_active,
        identities: IdentityKeys { active, passive },
    }))
}

fn identity_key(
    home: Option<&Path>,
    base_dir: &Path,
    key: &str,
    keypair_file: Option<String>,
    pubkey: Option<String>,
) -> Result<String, ConfigError> {
    match (keypair_file, pubkey) {
        (Some(_), Some(_)) => Err(ConfigError::invalid(
            key,
            "set either a keypair file or a pubkey, not both",
        )),
        (Some(file), None) => {
            let path = resolve_path_at(home, &file, base_dir)?;
            pubkey_from_keypair_file(key, &path)
        }
        (None, Some(pubkey)) if !pubkey.trim().is_empty() => Ok(pubkey.trim().to_string()),
        _ => Err(ConfigError::invalid(
            key,
            "required when validator.rpc_url is configured",
        )),
    }
}

fn validate_sync(
    home: Option<&Path>,
    base_dir: &Path,
    section: SyncSection,
) -> Result<SyncConfig, ConfigError> {
    for (i, command) in section.commands.iter().enumerate() {
        if command.name.trim().is_empty() {
            return Err(ConfigError::invalid(
                format!("sync.commands[{i}].name"),
                "must not be empty",
            ));
        }
        if command.cmd.trim().is_empty() {
            return Err(ConfigError::invalid(
                format!("sync.commands[{i}].cmd"),
                format!("command '{}' has an empty cmd", command.name),
            ));
        }
    }

    let lock_file = match section.lock_file.filter(|p| !p.trim().is_empty()) {
        None => None,
        Some(raw) => Some(resolve_path_at(home, &raw, base_dir)?),
    };

    Ok(SyncConfig {
        lock_file,
        commands: section.commands,
    })
}

fn validate_http_url(key: &str, raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ConfigError::invalid(key, format!("'{raw}' is not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid(
            key,
            format!("unsupported scheme '{other}' in '{raw}'"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Resolve `raw` to an absolute path.
///
/// - absolute paths are returned as-is
/// - `~/…` expands against `home`
/// - anything else is joined onto `base_dir`
pub fn resolve_path_at(
    home: Option<&Path>,
    raw: &str,
    base_dir: &Path,
) -> Result<PathBuf, ConfigError> {
    let path = Path::new(raw);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = home.ok_or(ConfigError::HomeNotFound)?;
        return Ok(home.join(rest));
    }
    Ok(base_dir.join(path))
}

/// Whether a `bin` value names a path rather than a command on `$PATH`.
pub fn is_file_path(value: &str) -> bool {
    value.contains('/') || value.contains('\\')
}
