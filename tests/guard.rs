// tests/guard.rs

use std::error::Error;
use std::sync::{Arc, Mutex};

use phpguard::engine::{Hook, PhpGuard};
use phpguard::errors::PhpGuardError;
use phpguard::plugin::CommandPlugin;
use phpguard::types::{ChangeSet, DEFAULT_LATENCY_MICROS};
use phpguard_test_utils::builders::Project;
use phpguard_test_utils::fakes::{CountingCompiler, FakeRunner, Record, RecordingSubscriber};
use phpguard_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

const MINIMAL: &str = "phpguard:\n  latency: 250000\n  ignores: vendor\n";

fn hooks(log: &Arc<Mutex<Vec<Record>>>) -> Vec<Hook> {
    log.lock().unwrap().iter().map(|r| r.hook).collect()
}

#[test]
fn empty_changeset_fires_nothing() -> TestResult {
    init_tracing();
    let project = Project::new()?;
    let (ctx, _) = project.context();
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut guard = PhpGuard::builder(ctx)
        .subscriber(RecordingSubscriber::everywhere("spy", 0, log.clone()))
        .build();

    let results = guard.listen(ChangeSet::default())?;
    assert!(results.is_empty());
    assert!(log.lock().unwrap().is_empty());
    Ok(())
}

#[test]
fn changeset_fires_pre_then_exactly_one_post() -> TestResult {
    let project = Project::new()?;
    let (ctx, _) = project.context();
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut guard = PhpGuard::builder(ctx)
        .subscriber(RecordingSubscriber::everywhere("spy", 0, log.clone()))
        .build();

    let file = project.file("src/Foo.php", "<?php")?;
    guard.listen(ChangeSet::new([file.clone()]))?;

    assert_eq!(hooks(&log), vec![Hook::PreEvaluate, Hook::PostEvaluate]);
    let post = log.lock().unwrap()[1].clone();
    assert_eq!(post.files, vec![file]);
    Ok(())
}

#[test]
fn run_all_fires_run_all_hooks() -> TestResult {
    let project = Project::new()?;
    let (ctx, _) = project.context();
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut guard = PhpGuard::builder(ctx)
        .subscriber(RecordingSubscriber::everywhere("spy", 0, log.clone()))
        .build();

    guard.run_all()?;
    assert_eq!(hooks(&log), vec![Hook::PreRunAll, Hook::PostRunAll]);
    Ok(())
}

#[test]
fn load_configuration_compiles_once_without_reload() -> TestResult {
    let project = Project::new()?;
    project.config(MINIMAL)?;
    let (ctx, _) = project.context();
    let compiler = CountingCompiler::default();
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut guard = PhpGuard::builder(ctx)
        .compiler(compiler.clone())
        .subscriber(RecordingSubscriber::everywhere("spy", 0, log.clone()))
        .build();

    guard.load_configuration(false)?;
    guard.load_configuration(false)?;
    assert_eq!(compiler.count(), 1);
    assert_eq!(hooks(&log), vec![Hook::PreLoadConfig, Hook::PostLoadConfig]);

    guard.load_configuration(true)?;
    assert_eq!(compiler.count(), 2);
    Ok(())
}

#[test]
fn load_configuration_applies_guard_options() -> TestResult {
    let project = Project::new()?;
    project.config(MINIMAL)?;
    let (ctx, _) = project.context();
    let mut guard = PhpGuard::builder(ctx).build();

    assert_eq!(guard.options().latency, DEFAULT_LATENCY_MICROS);
    guard.load_configuration(false)?;

    assert_eq!(guard.options().latency, 250_000);
    assert_eq!(guard.options().ignores, vec!["vendor".to_string()]);
    assert_eq!(guard.config_file(), Some(project.path("phpguard.yml").as_path()));
    Ok(())
}

#[test]
fn missing_config_is_config_not_found() -> TestResult {
    let project = Project::new()?;
    let (ctx, _) = project.context();
    let mut guard = PhpGuard::builder(ctx).build();

    match guard.load_configuration(false) {
        Err(PhpGuardError::ConfigNotFound(dir)) => assert_eq!(dir, project.root()),
        other => panic!("expected ConfigNotFound, got {other:?}"),
    }
    assert!(!guard.is_configured());
    Ok(())
}

#[test]
fn prefers_phpguard_yml_over_dist() -> TestResult {
    let project = Project::new()?;
    project.dist_config("phpguard:\n  latency: 1\n")?;
    let (ctx, _) = project.context();
    let mut guard = PhpGuard::builder(ctx).build();

    guard.load_configuration(false)?;
    assert_eq!(guard.options().latency, 1);

    project.config("phpguard:\n  latency: 2\n")?;
    guard.load_configuration(true)?;
    assert_eq!(guard.options().latency, 2);
    assert_eq!(guard.config_file(), Some(project.path("phpguard.yml").as_path()));
    Ok(())
}

#[test]
fn unknown_plugin_section_is_rejected() -> TestResult {
    let project = Project::new()?;
    project.config("behat:\n  watch:\n    - pattern: \"^features/\"\n")?;
    let (ctx, _) = project.context();
    let mut guard = PhpGuard::builder(ctx)
        .plugin(CommandPlugin::phpunit().with_runner(FakeRunner::exiting_with(0)))
        .build();

    let err = guard.load_configuration(false).err().ok_or("expected an error")?;
    assert!(matches!(err, PhpGuardError::ConfigError(ref msg) if msg.contains("behat")));
    Ok(())
}

#[test]
fn watch_entry_without_pattern_is_rejected() -> TestResult {
    let project = Project::new()?;
    project.config("phpunit:\n  watch:\n    - tags: unit\n")?;
    let (ctx, _) = project.context();
    let mut guard = PhpGuard::builder(ctx)
        .plugin(CommandPlugin::phpunit().with_runner(FakeRunner::exiting_with(0)))
        .build();

    let err = guard.load_configuration(false).err().ok_or("expected an error")?;
    assert!(matches!(err, PhpGuardError::ConfigError(ref msg) if msg.contains("pattern")));
    Ok(())
}

#[test]
fn unregistered_lint_is_rejected_at_load() -> TestResult {
    let project = Project::new()?;
    project.config("phpunit:\n  watch:\n    - pattern: \"^src/\"\n      lint: nope\n")?;
    let (ctx, _) = project.context();
    let mut guard = PhpGuard::builder(ctx)
        .plugin(CommandPlugin::phpunit().with_runner(FakeRunner::exiting_with(0)))
        .build();

    match guard.load_configuration(false) {
        Err(PhpGuardError::UnknownLinter(id)) => assert_eq!(id, "nope"),
        other => panic!("expected UnknownLinter, got {other:?}"),
    }
    Ok(())
}

#[test]
fn all_on_start_is_read_from_plugin_options() -> TestResult {
    let project = Project::new()?;
    project.config("phpunit:\n  options:\n    all_on_start: true\n")?;
    let (ctx, _) = project.context();
    let mut guard = PhpGuard::builder(ctx)
        .plugin(CommandPlugin::phpunit().with_runner(FakeRunner::exiting_with(0)))
        .build();

    assert!(!guard.wants_run_all_on_start());
    guard.load_configuration(false)?;
    assert!(guard.wants_run_all_on_start());
    Ok(())
}
