//! Domain enums shared by the resolver, the gates and the orchestrator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Cluster
// ---------------------------------------------------------------------------

/// A named DoubleZero deployment environment.
///
/// Variant order is the positional order in which the documentation page
/// lists its install examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    MainnetBeta,
    Testnet,
}

impl Cluster {
    /// All clusters in documentation order.
    pub fn all() -> &'static [Cluster] {
        &[Cluster::MainnetBeta, Cluster::Testnet]
    }

    /// Position of this cluster's install example when no markers are present.
    pub fn position(&self) -> usize {
        match self {
            Cluster::MainnetBeta => 0,
            Cluster::Testnet => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cluster {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cluster::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCluster(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ValidatorRole
// ---------------------------------------------------------------------------

/// Role of the colocated validator, derived from its reported identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorRole {
    Unknown,
    Active,
    Passive,
}

impl ValidatorRole {
    /// Classify `reported` by exact string equality against the two keys.
    ///
    /// The active key wins if both configured keys are equal.
    pub fn classify(reported: &str, active: &str, passive: &str) -> Self {
        if reported == active {
            ValidatorRole::Active
        } else if reported == passive {
            ValidatorRole::Passive
        } else {
            ValidatorRole::Unknown
        }
    }
}

impl fmt::Display for ValidatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorRole::Unknown => write!(f, "unknown"),
            ValidatorRole::Active => write!(f, "active"),
            ValidatorRole::Passive => write!(f, "passive"),
        }
    }
}

// ---------------------------------------------------------------------------
// SyncDecision
// ---------------------------------------------------------------------------

/// Terminal outcome of one sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncDecision {
    NoChange,
    BlockedByIdentity,
    BlockedByConstraint,
    NoCommandsConfigured,
    Proceed,
}

impl fmt::Display for SyncDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDecision::NoChange => write!(f, "no-change"),
            SyncDecision::BlockedByIdentity => write!(f, "blocked-by-identity"),
            SyncDecision::BlockedByConstraint => write!(f, "blocked-by-constraint"),
            SyncDecision::NoCommandsConfigured => write!(f, "no-commands-configured"),
            SyncDecision::Proceed => write!(f, "proceed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_round_trips_through_str() {
        for cluster in Cluster::all() {
            assert_eq!(cluster.as_str().parse::<Cluster>().unwrap(), *cluster);
        }
    }

    #[test]
    fn unknown_cluster_is_rejected() {
        let err = "devnet".parse::<Cluster>().unwrap_err();
        assert_eq!(err, CoreError::UnknownCluster("devnet".into()));
        assert!(err.to_string().contains("mainnet-beta, testnet"));
    }

    #[test]
    fn cluster_positions_follow_documentation_order() {
        let positions: Vec<usize> = Cluster::all().iter().map(Cluster::position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn role_classification() {
        assert_eq!(ValidatorRole::classify("A", "A", "P"), ValidatorRole::Active);
        assert_eq!(ValidatorRole::classify("P", "A", "P"), ValidatorRole::Passive);
        assert_eq!(ValidatorRole::classify("X", "A", "P"), ValidatorRole::Unknown);
    }

    #[test]
    fn decision_display_is_kebab_case() {
        assert_eq!(SyncDecision::NoCommandsConfigured.to_string(), "no-commands-configured");
        assert_eq!(
            serde_json::to_string(&SyncDecision::BlockedByIdentity).unwrap(),
            "\"blocked-by-identity\""
        );
    }
}
