//! Installed-version probe: runs `<bin> --version`.

use std::process::Command;

use regex::Regex;

use dzsync_core::{Cluster, ParsedVersion};

use crate::error::SyncError;

/// Reports the version of the locally installed DoubleZero client.
pub trait VersionProbe: Send + Sync {
    fn installed_version(&self) -> Result<ParsedVersion, SyncError>;
}

/// Snapshot of the local installation taken at the start of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledState {
    pub cluster: Cluster,
    pub version_string: String,
    pub version: ParsedVersion,
}

/// Probe that shells out to the configured binary.
pub struct BinaryProbe {
    bin: String,
    pattern: Regex,
}

impl BinaryProbe {
    pub fn new(bin: impl Into<String>) -> Result<Self, SyncError> {
        Ok(BinaryProbe {
            bin: bin.into(),
            pattern: Regex::new(r"(\d+\.\d+\.\d+(?:-\d+)?)")?,
        })
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// First version-looking token in `output`.
    pub fn parse_output(&self, output: &str) -> Result<ParsedVersion, SyncError> {
        let output = output.trim();
        let text = self
            .pattern
            .captures(output)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| self.failed(format!("could not extract version from output: {output}")))?;
        ParsedVersion::parse(text).map_err(|source| SyncError::VersionParse {
            text: text.to_string(),
            source,
        })
    }

    fn failed(&self, reason: String) -> SyncError {
        SyncError::Probe {
            bin: self.bin.clone(),
            reason,
        }
    }
}

impl VersionProbe for BinaryProbe {
    fn installed_version(&self) -> Result<ParsedVersion, SyncError> {
        let output = Command::new(&self.bin)
            .arg("--version")
            .output()
            .map_err(|e| self.failed(format!("failed to run: {e}")))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(self.failed(format!(
                "exited with {}: {}",
                output.status,
                combined.trim()
            )));
        }

        let version = self.parse_output(&combined)?;
        tracing::debug!(bin = %self.bin, version = %version, output = %combined.trim(), "found installed version from bin");
        Ok(version)
    }
}
