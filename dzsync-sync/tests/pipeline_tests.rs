mod common;

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

use common::{
    positional_page, FailingProbe, FixedIdentity, FixedProbe, RecordingExecutor, StaticFetcher,
};
use dzsync_core::keys::IdentityKeys;
use dzsync_core::{Cluster, CommandSpec, Direction, SyncDecision, VersionConstraint};
use dzsync_renderer::TemplateEngine;
use dzsync_sync::{IdentityGate, SyncError, Syncer, VersionSource};

fn command(name: &str, args: &[&str]) -> CommandSpec {
    CommandSpec {
        name: name.to_string(),
        cmd: "echo".to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        environment: BTreeMap::new(),
        allow_failure: false,
        stream_output: false,
        disabled: false,
    }
}

fn install_commands() -> Vec<CommandSpec> {
    vec![command(
        "install",
        &[
            "{{ ClusterName }}",
            "{{ VersionFrom }}",
            "{{ VersionTo }}",
            "{{ PackageVersionTo }}",
            "{{ CommandIndex }}/{{ CommandsCount }}",
        ],
    )]
}

struct Harness {
    syncer: Syncer,
    executor: RecordingExecutor,
}

fn harness(installed: &'static str, commands: Vec<CommandSpec>, executor: RecordingExecutor) -> Harness {
    let page = positional_page("0.7.1-1", "0.7.2-1");
    let source = VersionSource::new(Box::new(StaticFetcher::new(page)), "http://docs.invalid/")
        .expect("source");
    let templates = TemplateEngine::new(&commands).expect("templates");
    let syncer = Syncer::new(
        Cluster::MainnetBeta,
        Box::new(FixedProbe(installed)),
        source,
        templates,
        Box::new(executor.clone()),
    );
    Harness { syncer, executor }
}

fn keys() -> IdentityKeys {
    IdentityKeys {
        active: "ActiveKey".to_string(),
        passive: "PassiveKey".to_string(),
    }
}

// ---------------------------------------------------------------------------
// 1. Decisions
// ---------------------------------------------------------------------------

#[test]
fn upgrade_proceeds_with_populated_template_data() {
    let h = harness("0.6.9", install_commands(), RecordingExecutor::default());

    let outcome = h.syncer.sync_version(false).expect("sync");

    assert_eq!(outcome.decision, SyncDecision::Proceed);
    assert_eq!(outcome.package_version, "0.7.1-1");
    assert_eq!(outcome.diff.direction(), Some(Direction::Upgrade));
    assert_eq!(outcome.executed, vec!["install"]);

    let ran = h.executor.ran();
    assert_eq!(ran.len(), 1);
    assert_eq!(ran[0].program, "echo");
    assert_eq!(
        ran[0].args,
        vec!["mainnet-beta", "0.6.9", "0.7.1", "0.7.1-1", "0/1"]
    );
}

#[test]
fn same_core_version_is_no_change() {
    let h = harness("0.7.1", install_commands(), RecordingExecutor::default());

    let outcome = h.syncer.sync_version(false).expect("sync");

    assert_eq!(outcome.decision, SyncDecision::NoChange);
    assert!(outcome.diff.is_same_version());
    assert!(h.executor.ran().is_empty());
}

#[test]
fn downgrade_is_a_required_change() {
    let h = harness("0.8.0", install_commands(), RecordingExecutor::default());
    let outcome = h.syncer.sync_version(false).expect("sync");
    assert_eq!(outcome.decision, SyncDecision::Proceed);
    assert_eq!(outcome.diff.direction(), Some(Direction::Downgrade));
}

#[test]
fn no_commands_is_a_warning_not_an_error() {
    let h = harness("0.6.9", Vec::new(), RecordingExecutor::default());
    let outcome = h.syncer.sync_version(false).expect("sync");
    assert_eq!(outcome.decision, SyncDecision::NoCommandsConfigured);
}

#[test]
fn all_disabled_commands_count_as_none_configured() {
    let mut spec = command("install", &[]);
    spec.disabled = true;
    let h = harness("0.6.9", vec![spec], RecordingExecutor::default());
    let outcome = h.syncer.sync_version(false).expect("sync");
    assert_eq!(outcome.decision, SyncDecision::NoCommandsConfigured);
    assert!(h.executor.ran().is_empty());
}

#[test]
fn dry_run_renders_but_executes_nothing() {
    let h = harness("0.6.9", install_commands(), RecordingExecutor::default());
    let outcome = h.syncer.sync_version(true).expect("sync");
    assert_eq!(outcome.decision, SyncDecision::Proceed);
    assert!(outcome.executed.is_empty());
    assert!(h.executor.ran().is_empty());
}

#[test]
fn document_is_fetched_for_version_and_package() {
    let fetcher = StaticFetcher::new(positional_page("0.7.1-1", "0.7.2-1"));
    let fetches = fetcher.fetches.clone();
    let syncer = Syncer::new(
        Cluster::Testnet,
        Box::new(FixedProbe("0.7.2")),
        VersionSource::new(Box::new(fetcher), "http://docs.invalid/").unwrap(),
        TemplateEngine::new(&[]).unwrap(),
        Box::new(RecordingExecutor::default()),
    );
    let outcome = syncer.sync_version(false).unwrap();
    assert_eq!(outcome.decision, SyncDecision::NoChange);
    assert_eq!(outcome.package_version, "0.7.2-1");
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// 2. Gates
// ---------------------------------------------------------------------------

#[test]
fn active_validator_blocks_sync() {
    let h = harness("0.6.9", install_commands(), RecordingExecutor::default());
    let syncer = h
        .syncer
        .with_identity_gate(IdentityGate::new(Box::new(FixedIdentity("ActiveKey")), keys(), false));

    let err = syncer.sync_version(false).unwrap_err();

    assert!(matches!(err, SyncError::ActiveIdentityBlocked { .. }), "got {err}");
    assert_eq!(err.decision(), Some(SyncDecision::BlockedByIdentity));
    assert!(h.executor.ran().is_empty());
}

#[test]
fn active_validator_allowed_when_enabled() {
    let h = harness("0.6.9", install_commands(), RecordingExecutor::default());
    let syncer = h
        .syncer
        .with_identity_gate(IdentityGate::new(Box::new(FixedIdentity("ActiveKey")), keys(), true));
    let outcome = syncer.sync_version(false).expect("sync");
    assert_eq!(outcome.decision, SyncDecision::Proceed);
}

#[test]
fn passive_validator_proceeds() {
    let h = harness("0.6.9", install_commands(), RecordingExecutor::default());
    let syncer = h
        .syncer
        .with_identity_gate(IdentityGate::new(Box::new(FixedIdentity("PassiveKey")), keys(), false));
    assert_eq!(
        syncer.sync_version(false).expect("sync").decision,
        SyncDecision::Proceed
    );
}

#[test]
fn unknown_identity_blocks_even_without_a_version_change() {
    let h = harness("0.7.1", install_commands(), RecordingExecutor::default());
    let syncer = h
        .syncer
        .with_identity_gate(IdentityGate::new(Box::new(FixedIdentity("Stranger")), keys(), true));
    let err = syncer.sync_version(false).unwrap_err();
    assert!(matches!(err, SyncError::UnknownIdentity { .. }), "got {err}");
}

#[test]
fn constraint_violation_blocks_sync() {
    let h = harness("0.6.9", install_commands(), RecordingExecutor::default());
    let syncer = h
        .syncer
        .with_constraint(VersionConstraint::parse(">=0.6.9, <0.7.1").unwrap());

    let err = syncer.sync_version(false).unwrap_err();

    assert_eq!(err.decision(), Some(SyncDecision::BlockedByConstraint));
    assert!(h.executor.ran().is_empty());
}

#[test]
fn satisfied_constraint_proceeds() {
    let h = harness("0.6.9", install_commands(), RecordingExecutor::default());
    let syncer = h
        .syncer
        .with_constraint(VersionConstraint::parse(">=0.6.9, <0.7.2").unwrap());
    assert_eq!(
        syncer.sync_version(false).expect("sync").decision,
        SyncDecision::Proceed
    );
}

// ---------------------------------------------------------------------------
// 3. Execution
// ---------------------------------------------------------------------------

#[test]
fn failing_command_aborts_the_sequence() {
    let commands = vec![command("stop", &[]), command("install", &[]), command("start", &[])];
    let h = harness("0.6.9", commands, RecordingExecutor::failing(&["install"]));

    let err = h.syncer.sync_version(false).unwrap_err();

    assert!(matches!(err, SyncError::CommandExecution { ref name, .. } if name == "install"));
    let names: Vec<_> = h.executor.ran().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["stop", "install"]);
}

#[test]
fn allow_failure_continues_the_sequence() {
    let mut flaky = command("install", &[]);
    flaky.allow_failure = true;
    let commands = vec![command("stop", &[]), flaky, command("start", &["{{ CommandIndex }}/{{ CommandsCount }}"])];
    let h = harness("0.6.9", commands, RecordingExecutor::failing(&["install"]));

    let outcome = h.syncer.sync_version(false).expect("sync");

    assert_eq!(outcome.executed, vec!["stop", "install", "start"]);
    assert_eq!(h.executor.ran()[2].args, vec!["2/3"]);
}

#[test]
fn disabled_commands_are_skipped_and_not_counted() {
    let mut skipped = command("notify", &[]);
    skipped.disabled = true;
    let commands = vec![skipped, command("install", &["{{ CommandIndex }}/{{ CommandsCount }}"])];
    let h = harness("0.6.9", commands, RecordingExecutor::default());

    let outcome = h.syncer.sync_version(false).expect("sync");

    assert_eq!(outcome.executed, vec!["install"]);
    assert_eq!(h.executor.ran()[0].args, vec!["0/1"]);
}

#[test]
fn held_lock_fails_the_cycle() {
    let dir = tempfile::TempDir::new().unwrap();
    let lock_path = dir.path().join("dzsync.lock");
    let _held = dzsync_sync::SyncLock::acquire(&lock_path).expect("hold lock");

    let h = harness("0.6.9", install_commands(), RecordingExecutor::default());
    let syncer = h.syncer.with_lock_file(&lock_path);

    let err = syncer.sync_version(false).unwrap_err();
    assert!(matches!(err, SyncError::LockHeld { .. }), "got {err}");
    assert!(h.executor.ran().is_empty());
}

#[test]
fn probe_failure_stops_before_fetching() {
    let fetcher = StaticFetcher::new(positional_page("0.7.1-1", "0.7.2-1"));
    let fetches = fetcher.fetches.clone();
    let syncer = Syncer::new(
        Cluster::MainnetBeta,
        Box::new(FailingProbe),
        VersionSource::new(Box::new(fetcher), "http://docs.invalid/").unwrap(),
        TemplateEngine::new(&install_commands()).unwrap(),
        Box::new(RecordingExecutor::default()),
    );
    let err = syncer.sync_version(false).unwrap_err();
    assert!(matches!(err, SyncError::Probe { .. }));
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}
