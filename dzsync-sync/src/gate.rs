//! Identity and constraint gates.

use dzsync_core::keys::IdentityKeys;
use dzsync_core::{ParsedVersion, ValidatorRole, VersionConstraint};

use crate::error::SyncError;
use crate::rpc::IdentityClient;

/// Blocks syncs while the colocated validator is active (unless allowed) or
/// running under an identity that is neither configured key.
pub struct IdentityGate {
    client: Box<dyn IdentityClient>,
    identities: IdentityKeys,
    enabled_when_active: bool,
}

impl IdentityGate {
    pub fn new(
        client: Box<dyn IdentityClient>,
        identities: IdentityKeys,
        enabled_when_active: bool,
    ) -> Self {
        IdentityGate {
            client,
            identities,
            enabled_when_active,
        }
    }

    /// Query the validator and apply the gate. Never cached.
    pub fn evaluate(&self) -> Result<ValidatorRole, SyncError> {
        let reported = self.client.get_identity()?;
        evaluate_identity(&reported, &self.identities, self.enabled_when_active)
    }
}

/// Apply the gate to an already-reported identity.
pub fn evaluate_identity(
    reported: &str,
    identities: &IdentityKeys,
    enabled_when_active: bool,
) -> Result<ValidatorRole, SyncError> {
    let role = ValidatorRole::classify(reported, &identities.active, &identities.passive);
    match role {
        ValidatorRole::Unknown => Err(SyncError::UnknownIdentity {
            reported: reported.to_string(),
            active: identities.active.clone(),
            passive: identities.passive.clone(),
        }),
        ValidatorRole::Active if !enabled_when_active => {
            tracing::warn!(identity = %reported, "validator is running as active identity - refusing to sync");
            Err(SyncError::ActiveIdentityBlocked {
                identity: reported.to_string(),
            })
        }
        ValidatorRole::Active => {
            tracing::warn!(
                identity = %reported,
                "validator is running as active identity - proceeding with sync (enabled_when_active=true)"
            );
            Ok(role)
        }
        ValidatorRole::Passive => {
            tracing::info!(identity = %reported, "validator is running as passive identity - proceeding with sync");
            Ok(role)
        }
    }
}

/// Check `target`'s core version against the operator's constraint, if any.
pub fn check_constraint(
    constraint: Option<&VersionConstraint>,
    target: &ParsedVersion,
) -> Result<(), SyncError> {
    let Some(constraint) = constraint else {
        return Ok(());
    };
    if !constraint.satisfied_by(target) {
        return Err(SyncError::ConstraintViolation {
            target: target.core_string(),
            constraint: constraint.to_string(),
        });
    }
    tracing::debug!(constraint = %constraint, target = %target.core_string(), "target version satisfies version constraint");
    Ok(())
}
