// tests/runtime.rs

use std::error::Error;

use phpguard::engine::{CycleSummary, EvalResult, PhpGuard, Runtime, RuntimeEvent};
use phpguard::plugin::CommandPlugin;
use phpguard::types::ChangeSet;
use phpguard_test_utils::builders::Project;
use phpguard_test_utils::fakes::FakeRunner;
use phpguard_test_utils::{init_tracing, with_timeout};
use tokio::sync::mpsc;

type TestResult = Result<(), Box<dyn Error>>;

const CONFIG: &str = "phpguard:\n  latency: 1000\nphpunit:\n  watch:\n    - pattern: \"^tests/\"\n";

fn guard(project: &Project, runner: &FakeRunner) -> Result<PhpGuard, Box<dyn Error>> {
    init_tracing();
    project.config(CONFIG)?;
    project.file("tests/FooTest.php", "<?php")?;

    let (ctx, _) = project.context();
    let mut guard = PhpGuard::builder(ctx)
        .plugin(CommandPlugin::phpunit().with_runner(runner.clone()))
        .build();
    guard.load_configuration(false)?;
    Ok(guard)
}

#[test]
fn step_dispatches_events_until_shutdown() -> TestResult {
    let project = Project::new()?;
    let runner = FakeRunner::exiting_with(0);
    let (_tx, rx) = mpsc::channel(1);
    let mut runtime = Runtime::new(guard(&project, &runner)?, rx);

    let changed = ChangeSet::new([project.path("tests/FooTest.php")]);
    assert!(runtime.step(RuntimeEvent::FilesChanged(changed)));
    assert_eq!(runner.calls().len(), 1);

    assert!(runtime.step(RuntimeEvent::RunAllRequested));
    assert_eq!(runner.calls().len(), 2);
    assert!(runner.calls()[1].files.is_empty());

    assert!(!runtime.step(RuntimeEvent::ShutdownRequested));
    Ok(())
}

#[test]
fn config_change_reloads_before_the_cycle() -> TestResult {
    let project = Project::new()?;
    let runner = FakeRunner::exiting_with(0);
    let (_tx, rx) = mpsc::channel(1);
    let mut runtime = Runtime::new(guard(&project, &runner)?, rx);
    assert_eq!(runtime.guard().options().latency, 1000);

    let config = project.config(&CONFIG.replace("1000", "2000"))?;
    assert!(runtime.step(RuntimeEvent::FilesChanged(ChangeSet::new([config]))));

    assert_eq!(runtime.guard().options().latency, 2000);
    assert!(runner.calls().is_empty());
    Ok(())
}

#[test]
fn broken_config_keeps_the_daemon_alive() -> TestResult {
    let project = Project::new()?;
    let runner = FakeRunner::exiting_with(0);
    let (_tx, rx) = mpsc::channel(1);
    let mut runtime = Runtime::new(guard(&project, &runner)?, rx);

    let config = project.config("phpguard: [unclosed")?;
    let test = project.path("tests/FooTest.php");
    assert!(runtime.step(RuntimeEvent::FilesChanged(ChangeSet::new([config, test]))));

    assert!(runner.calls().is_empty(), "the cycle is aborted");
    assert_eq!(runtime.guard().options().latency, 1000);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn run_loop_stops_on_shutdown() -> TestResult {
    let project = Project::new()?;
    let runner = FakeRunner::exiting_with(1);
    let (tx, rx) = mpsc::channel(8);
    let runtime = Runtime::new(guard(&project, &runner)?, rx);

    tx.send(RuntimeEvent::FilesChanged(ChangeSet::new([
        project.path("tests/FooTest.php"),
    ])))
    .await?;
    tx.send(RuntimeEvent::ShutdownRequested).await?;
    tx.send(RuntimeEvent::RunAllRequested).await?;

    with_timeout(runtime.run()).await?;

    assert_eq!(runner.calls().len(), 1, "events after shutdown are not handled");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn run_loop_ends_when_senders_are_gone() -> TestResult {
    let project = Project::new()?;
    let runner = FakeRunner::exiting_with(0);
    let (tx, rx) = mpsc::channel(8);
    let runtime = Runtime::new(guard(&project, &runner)?, rx);

    tx.send(RuntimeEvent::RunAllRequested).await?;
    drop(tx);

    with_timeout(runtime.run()).await?;
    assert_eq!(runner.calls().len(), 1);
    Ok(())
}

#[test]
fn cycle_summary_counts_statuses() {
    let results = vec![
        EvalResult::succeeded("a"),
        EvalResult::succeeded("b"),
        EvalResult::failed("c"),
        EvalResult::broken("d", std::io::Error::other("boom")),
    ];
    let summary = CycleSummary::of(&results);

    assert_eq!(
        summary,
        CycleSummary {
            succeeded: 2,
            failed: 1,
            broken: 1,
            errors: 0,
        }
    );
    assert!(!summary.is_green());
    assert!(CycleSummary::of(&results[..2]).is_green());
    assert!(CycleSummary::of(&[]).is_green());
}
