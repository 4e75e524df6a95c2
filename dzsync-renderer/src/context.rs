//! Template data: the per-command rendering payload built for a sync cycle.

use serde::{Deserialize, Serialize};

use dzsync_core::{Cluster, ParsedVersion};

use crate::error::RenderError;

/// Variables available to every command template, exposed under their
/// PascalCase names (`{{ PackageVersionTo }}`, `{{ CommandIndex }}`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandTemplateData {
    /// `mainnet-beta` or `testnet`.
    pub cluster_name: String,
    /// Zero-based position of the command in the configured sequence.
    pub command_index: usize,
    pub commands_count: usize,
    /// Installed core version, e.g. `0.6.9`.
    pub version_from: String,
    /// Recommended core version, e.g. `0.7.1`.
    pub version_to: String,
    /// Recommended package version, e.g. `0.7.1-1`.
    pub package_version_to: String,
}

impl CommandTemplateData {
    /// Data for command `command_index` of `commands_count`.
    pub fn for_command(
        cluster: Cluster,
        command_index: usize,
        commands_count: usize,
        from: &ParsedVersion,
        to: &ParsedVersion,
        package_version: &str,
    ) -> Self {
        CommandTemplateData {
            cluster_name: cluster.as_str().to_string(),
            command_index,
            commands_count,
            version_from: from.core_string(),
            version_to: to.core_string(),
            package_version_to: package_version.to_string(),
        }
    }

    /// Representative values used to check templates before the first cycle.
    pub fn sample() -> Self {
        CommandTemplateData {
            cluster_name: Cluster::MainnetBeta.as_str().to_string(),
            command_index: 0,
            commands_count: 1,
            version_from: "0.6.9".to_string(),
            version_to: "0.7.1".to_string(),
            package_version_to: "0.7.1-1".to_string(),
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_pascal_case_keys() {
        let json = serde_json::to_value(CommandTemplateData::sample()).unwrap();
        for key in [
            "ClusterName",
            "CommandIndex",
            "CommandsCount",
            "VersionFrom",
            "VersionTo",
            "PackageVersionTo",
        ] {
            assert!(json.get(key).is_some(), "missing {key} in {json}");
        }
    }

    #[test]
    fn for_command_uses_core_versions_and_raw_package() {
        let from = ParsedVersion::parse("0.6.9-2").unwrap();
        let to = ParsedVersion::parse("0.7.1-1").unwrap();
        let data = CommandTemplateData::for_command(Cluster::Testnet, 1, 3, &from, &to, "0.7.1-1");
        assert_eq!(data.cluster_name, "testnet");
        assert_eq!(data.command_index, 1);
        assert_eq!(data.commands_count, 3);
        assert_eq!(data.version_from, "0.6.9");
        assert_eq!(data.version_to, "0.7.1");
        assert_eq!(data.package_version_to, "0.7.1-1");
    }

    #[test]
    fn to_tera_context_succeeds() {
        let ctx = CommandTemplateData::sample()
            .to_tera_context()
            .expect("context conversion");
        assert!(ctx.contains_key("PackageVersionTo"));
    }
}
