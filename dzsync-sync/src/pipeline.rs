//! Sync orchestrator: one cycle of probe → resolve → gate → diff → execute.

use std::path::PathBuf;

use dzsync_core::{Cluster, Config, SyncDecision, VersionConstraint, VersionDiff};
use dzsync_renderer::{CommandTemplateData, TemplateEngine};

use crate::error::SyncError;
use crate::executor::{CommandExecutor, ProcessExecutor};
use crate::gate::{check_constraint, IdentityGate};
use crate::lock::SyncLock;
use crate::probe::{BinaryProbe, InstalledState, VersionProbe};
use crate::rpc::RpcClient;
use crate::source::{HttpFetcher, VersionSource};

/// Result of a cycle that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub decision: SyncDecision,
    pub diff: VersionDiff,
    /// Recommended package version, e.g. `0.7.1-1`.
    pub package_version: String,
    /// Names of the commands that ran, in order. Empty on a dry run.
    pub executed: Vec<String>,
}

/// Runs sync cycles for one cluster. Holds no per-cycle state.
pub struct Syncer {
    cluster: Cluster,
    probe: Box<dyn VersionProbe>,
    source: VersionSource,
    identity_gate: Option<IdentityGate>,
    constraint: Option<VersionConstraint>,
    templates: TemplateEngine,
    executor: Box<dyn CommandExecutor>,
    lock_file: Option<PathBuf>,
}

impl Syncer {
    pub fn new(
        cluster: Cluster,
        probe: Box<dyn VersionProbe>,
        source: VersionSource,
        templates: TemplateEngine,
        executor: Box<dyn CommandExecutor>,
    ) -> Self {
        Syncer {
            cluster,
            probe,
            source,
            identity_gate: None,
            constraint: None,
            templates,
            executor,
            lock_file: None,
        }
    }

    pub fn with_identity_gate(mut self, gate: IdentityGate) -> Self {
        self.identity_gate = Some(gate);
        self
    }

    pub fn with_constraint(mut self, constraint: VersionConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_lock_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_file = Some(path.into());
        self
    }

    /// Wire the real collaborators from a loaded config. Compiles every
    /// command template, so template errors surface here.
    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        let probe = BinaryProbe::new(config.doublezero.bin.clone())?;
        let source = VersionSource::new(Box::new(HttpFetcher::new()), config.doublezero.docs_url.clone())?;
        let templates = TemplateEngine::new(&config.sync.commands)?;

        let mut syncer = Syncer::new(
            config.cluster,
            Box::new(probe),
            source,
            templates,
            Box::new(ProcessExecutor),
        );
        if let Some(validator) = &config.validator {
            syncer = syncer.with_identity_gate(IdentityGate::new(
                Box::new(RpcClient::new(validator.rpc_url.clone())),
                validator.identities.clone(),
                validator.enabled_when_active,
            ));
        }
        if let Some(constraint) = &config.doublezero.version_constraint {
            syncer = syncer.with_constraint(constraint.clone());
        }
        if let Some(lock_file) = &config.sync.lock_file {
            syncer = syncer.with_lock_file(lock_file.clone());
        }

        tracing::debug!(
            cluster = %config.cluster,
            bin = %config.doublezero.bin,
            docs_url = %config.doublezero.docs_url,
            identity_gate = config.validator.is_some(),
            constraint = config.doublezero.version_constraint.is_some(),
            commands = config.sync.commands.len(),
            "created syncer from config"
        );
        Ok(syncer)
    }

    pub fn cluster(&self) -> Cluster {
        self.cluster
    }

    /// Probe the installed version.
    pub fn refresh_state(&self) -> Result<InstalledState, SyncError> {
        let version = self.probe.installed_version()?;
        Ok(InstalledState {
            cluster: self.cluster,
            version_string: version.to_string(),
            version,
        })
    }

    /// Run one cycle. Gate blocks are returned as errors; see
    /// [`SyncError::decision`].
    pub fn sync_version(&self, dry_run: bool) -> Result<SyncOutcome, SyncError> {
        let installed = self.refresh_state()?;
        tracing::debug!(cluster = %self.cluster, installed = %installed.version_string, "refreshed installed state");

        let target = self.source.recommended_version(self.cluster)?;
        let package_version = self.source.resolve(self.cluster)?;
        tracing::debug!(cluster = %self.cluster, target = %target.core_string(), package = %package_version, "final target sync version");

        if let Some(gate) = &self.identity_gate {
            gate.evaluate()?;
        }
        check_constraint(self.constraint.as_ref(), &target)?;

        let diff = VersionDiff::compare(Some(installed.version.clone()), Some(target.clone()));
        let outcome = |decision, executed| SyncOutcome {
            decision,
            diff: diff.clone(),
            package_version: package_version.clone(),
            executed,
        };

        if diff.is_same_version() {
            tracing::info!(cluster = %self.cluster, version = %target.core_string(), "DoubleZero already running target version - nothing to do");
            return Ok(outcome(SyncDecision::NoChange, Vec::new()));
        }

        let direction = diff
            .direction()
            .map(|d| d.to_string())
            .unwrap_or_default();
        tracing::info!(
            cluster = %self.cluster,
            direction = %direction,
            "{} {} required {}",
            diff.direction_symbol(),
            direction,
            diff
        );

        let enabled: Vec<usize> = self
            .templates
            .commands()
            .iter()
            .enumerate()
            .filter(|(_, spec)| {
                if spec.disabled {
                    tracing::info!(name = %spec.name, "command disabled - skipping");
                }
                !spec.disabled
            })
            .map(|(i, _)| i)
            .collect();

        if enabled.is_empty() {
            tracing::warn!(cluster = %self.cluster, "no configured commands to execute - skipping");
            return Ok(outcome(SyncDecision::NoCommandsConfigured, Vec::new()));
        }

        let _lock = match (&self.lock_file, dry_run) {
            (Some(path), false) => Some(SyncLock::acquire(path)?),
            _ => None,
        };

        let mut executed = Vec::new();
        for (position, &index) in enabled.iter().enumerate() {
            let data = CommandTemplateData::for_command(
                self.cluster,
                position,
                enabled.len(),
                &installed.version,
                &target,
                &package_version,
            );
            let command = self.templates.render(index, &data)?;

            if dry_run {
                tracing::info!(name = %command.name, command = %command.command_line(), "dry run - not executing");
                continue;
            }

            match self.executor.execute(&command) {
                Ok(()) => executed.push(command.name.clone()),
                Err(err) if command.allow_failure => {
                    tracing::warn!(name = %command.name, error = %err, "command failed - continuing (allow_failure=true)");
                    executed.push(command.name.clone());
                }
                Err(err) => return Err(err),
            }
        }

        if !dry_run {
            tracing::info!(cluster = %self.cluster, count = executed.len(), "commands executed successfully");
        }
        Ok(outcome(SyncDecision::Proceed, executed))
    }
}
