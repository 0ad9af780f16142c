// tests/config_loading.rs

use std::error::Error;
use std::path::PathBuf;

use phpguard::config::{
    CONFIG_FILE, DIST_CONFIG_FILE, load_from_path, load_from_str, resolve_config_path,
    validate_config,
};
use phpguard::errors::PhpGuardError;
use phpguard::lint::LinterRegistry;
use phpguard::types::DEFAULT_LATENCY_MICROS;
use phpguard_test_utils::builders::Project;

type TestResult = Result<(), Box<dyn Error>>;

const FULL: &str = r#"
phpguard:
  ignores: "vendor/**"
  latency: 300000
  coverage:
    enabled: true
    whitelist: [src]
    output.html: false
    output.clover: build/clover.xml
    output.text: true

phpunit:
  options:
    cli: "--colors"
    all_on_start: true
  watch:
    - pattern: '#^src/(.+)\.php$#'
      transform: 'tests/${1}Test.php'
      tags: unit
      groups: [core, model]
      lint: php

phpspec:
  watch:
    - pattern: "^spec/"
"#;

#[test]
fn full_document_is_compiled() -> TestResult {
    let cfg = load_from_str(FULL)?;

    assert_eq!(cfg.phpguard.ignores, vec!["vendor/**".to_string()]);
    assert_eq!(cfg.phpguard.latency, 300_000);

    let coverage = cfg.phpguard.coverage.clone().ok_or("coverage section")?;
    assert!(coverage.enabled);
    assert_eq!(coverage.whitelist, vec![PathBuf::from("src")]);
    assert_eq!(coverage.output_html, None);
    assert_eq!(coverage.output_clover, Some(PathBuf::from("build/clover.xml")));
    assert!(coverage.output_text);

    let phpunit = cfg.plugin("phpunit").ok_or("phpunit section")?;
    assert_eq!(phpunit.options.cli.as_deref(), Some("--colors"));
    assert!(phpunit.options.all_on_start);
    assert_eq!(phpunit.options.command, None);

    let rule = &phpunit.watch[0];
    assert_eq!(rule.tags, vec!["unit".to_string()]);
    assert_eq!(rule.groups, vec!["core".to_string(), "model".to_string()]);
    assert_eq!(rule.transform.as_deref(), Some("tests/${1}Test.php"));
    assert_eq!(rule.lint.as_deref(), Some("php"));

    let phpspec = cfg.plugin("phpspec").ok_or("phpspec section")?;
    assert!(phpspec.watch[0].tags.is_empty());
    assert!(cfg.plugin("behat").is_none());
    Ok(())
}

#[test]
fn defaults_apply_to_missing_keys() -> TestResult {
    let cfg = load_from_str("phpguard:\n  coverage:\n    enabled: true\n")?;

    assert_eq!(cfg.phpguard.latency, DEFAULT_LATENCY_MICROS);
    assert!(cfg.phpguard.ignores.is_empty());
    assert!(cfg.plugins.is_empty());

    let coverage = cfg.phpguard.coverage.ok_or("coverage section")?;
    assert!(coverage.show_uncovered_files);
    assert!(!coverage.show_only_summary);
    assert_eq!(coverage.lower_upper_bound, 35);
    assert_eq!(coverage.high_lower_bound, 70);
    assert!(!coverage.has_output());
    Ok(())
}

#[test]
fn empty_document_is_the_default_config() -> TestResult {
    for doc in ["", "# only a comment\n", "~"] {
        let cfg = load_from_str(doc)?;
        assert_eq!(cfg.phpguard.latency, DEFAULT_LATENCY_MICROS);
        assert!(cfg.plugins.is_empty());
        assert!(cfg.phpguard.coverage.is_none());
    }
    Ok(())
}

#[test]
fn malformed_yaml_is_a_configuration_error() {
    let err = load_from_str("phpguard: [unclosed").err();
    assert!(matches!(err, Some(PhpGuardError::YamlError(_))));
    assert!(err.is_some_and(|e| e.is_configuration()));
}

#[test]
fn validation_accepts_known_plugins_and_linters() -> TestResult {
    let cfg = load_from_str(FULL)?;
    validate_config(&cfg, &["phpunit", "phpspec"], &LinterRegistry::with_defaults())?;
    Ok(())
}

#[test]
fn validation_rejects_bad_sections() -> TestResult {
    let cfg = load_from_str(FULL)?;
    let linters = LinterRegistry::with_defaults();

    let err = validate_config(&cfg, &["phpunit"], &linters)
        .err()
        .ok_or("expected an error")?;
    assert!(matches!(err, PhpGuardError::ConfigError(ref m) if m.contains("phpspec")));

    let err = validate_config(&cfg, &["phpunit", "phpspec"], &LinterRegistry::new())
        .err()
        .ok_or("expected an error")?;
    assert!(matches!(err, PhpGuardError::UnknownLinter(ref id) if id == "php"));

    let bad_pattern = load_from_str("phpunit:\n  watch:\n    - pattern: \"(unclosed\"\n")?;
    let err = validate_config(&bad_pattern, &["phpunit"], &linters)
        .err()
        .ok_or("expected an error")?;
    assert!(matches!(err, PhpGuardError::ConfigError(ref m) if m.contains("phpunit.watch[0]")));

    let blank = load_from_str("phpunit:\n  watch:\n    - pattern: \"  \"\n")?;
    let err = validate_config(&blank, &["phpunit"], &linters)
        .err()
        .ok_or("expected an error")?;
    assert!(err.is_configuration());
    Ok(())
}

#[test]
fn config_path_prefers_yml_then_dist() -> TestResult {
    let project = Project::new()?;

    match resolve_config_path(project.root()) {
        Err(PhpGuardError::ConfigNotFound(dir)) => assert_eq!(dir, project.root()),
        other => return Err(format!("expected ConfigNotFound, got {other:?}").into()),
    }

    project.dist_config("phpguard: {}\n")?;
    assert_eq!(resolve_config_path(project.root())?, project.path(DIST_CONFIG_FILE));

    project.config("phpguard: {}\n")?;
    assert_eq!(resolve_config_path(project.root())?, project.path(CONFIG_FILE));
    Ok(())
}

#[test]
fn load_from_path_reads_the_file() -> TestResult {
    let project = Project::new()?;
    let path = project.config("phpguard:\n  latency: 42\n")?;

    assert_eq!(load_from_path(&path)?.phpguard.latency, 42);

    let missing = load_from_path(project.path("nope.yml")).err();
    assert!(matches!(missing, Some(PhpGuardError::IoError(_))));
    Ok(())
}
