// tests/result_model.rs

use std::collections::BTreeMap;
use std::error::Error;

use phpguard::engine::{EvalResult, ResultStatus};
use phpguard::errors::PhpGuardError;
use serde_json::json;

type TestResult = Result<(), Box<dyn Error>>;

fn predicates(r: &EvalResult) -> [bool; 4] {
    [r.is_succeed(), r.is_failed(), r.is_broken(), r.is_error()]
}

#[test]
fn status_predicates_are_exclusive() {
    let cause = || anyhow::anyhow!("boom");
    let cases = [
        (EvalResult::succeeded("a"), ResultStatus::Succeeded, 0),
        (EvalResult::failed("b"), ResultStatus::Failed, 1),
        (EvalResult::broken("c", cause()), ResultStatus::Broken, 2),
        (
            EvalResult::errored("d", BTreeMap::new(), cause(), None),
            ResultStatus::Error,
            3,
        ),
    ];

    for (result, status, idx) in cases {
        assert_eq!(result.status(), status);
        let flags = predicates(&result);
        assert_eq!(flags.iter().filter(|f| **f).count(), 1, "{status}");
        assert!(flags[idx], "{status}");
    }
}

#[test]
fn errored_without_trace_captures_one() {
    let result = EvalResult::errored("unit", BTreeMap::new(), anyhow::anyhow!("bad"), None);

    assert!(!result.trace().is_empty());
    assert!(result.trace()[0].contains("result_model.rs"));
    assert_eq!(result.cause().map(|c| c.to_string()).as_deref(), Some("bad"));
}

#[test]
fn errored_keeps_explicit_trace() {
    let result = EvalResult::errored(
        "unit",
        BTreeMap::new(),
        anyhow::anyhow!("bad"),
        Some(vec!["some_trace".to_string()]),
    );

    assert!(result.trace().iter().any(|f| f == "some_trace"));
}

#[test]
fn arguments_lookup() -> TestResult {
    let result = EvalResult::succeeded("PhpUnit")
        .with_arguments([("file", json!("src/Foo.php")), ("exit_code", json!(0))]);

    assert_eq!(result.name(), "PhpUnit");
    assert_eq!(result.argument("file")?, &json!("src/Foo.php"));
    assert_eq!(result.arguments().len(), 2);

    match result.argument("missing") {
        Err(PhpGuardError::UnknownArgument(key)) => assert_eq!(key, "missing"),
        other => panic!("expected UnknownArgument, got {other:?}"),
    }
    Ok(())
}

#[test]
fn broken_carries_io_cause() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "vendor/bin/phpunit");
    let result = EvalResult::broken("PhpUnit", io);

    assert!(result.is_broken());
    let cause = result.cause().expect("broken results have a cause");
    assert!(cause.downcast_ref::<std::io::Error>().is_some());
    assert!(result.trace().is_empty());
}
