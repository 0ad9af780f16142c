// tests/coverage_reports.rs

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use phpguard::coverage::report::{self, Rating};
use phpguard::coverage::{Accumulator, CoverageOptions, RawCoverage};
use phpguard_test_utils::builders::Project;

type TestResult = Result<(), Box<dyn Error>>;

fn sample(project: &Project) -> Result<Accumulator, Box<dyn Error>> {
    let covered = project.file("src/Covered.php", "<?php\necho 1;\necho 2;\n")?;
    let untouched = project.file("src/Untouched.php", "<?php\nif ($a < $b) {}\n")?;

    let mut data = RawCoverage::new();
    data.insert(covered, [(2, 1), (3, 1)].into_iter().collect());
    data.insert(untouched, [(2, 0)].into_iter().collect());

    let mut acc = Accumulator::new();
    acc.append("FooTest::testBar", data, true);
    Ok(acc)
}

#[test]
fn rating_follows_bounds() {
    let options = CoverageOptions::default();
    assert_eq!(report::rate(10.0, &options), Rating::Low);
    assert_eq!(report::rate(35.0, &options), Rating::Medium);
    assert_eq!(report::rate(69.9, &options), Rating::Medium);
    assert_eq!(report::rate(70.0, &options), Rating::High);
}

#[test]
fn text_report_lists_files_and_summary() -> TestResult {
    let project = Project::new()?;
    let acc = sample(&project)?;

    let text = report::render_text(&acc, project.root(), &CoverageOptions::default(), false);
    assert!(text.contains("66.67% (2/3)"), "{text}");
    assert!(text.contains("src/Covered.php"), "{text}");
    assert!(text.contains("src/Untouched.php"), "{text}");

    let hide_uncovered = CoverageOptions {
        show_uncovered_files: false,
        ..CoverageOptions::default()
    };
    let text = report::render_text(&acc, project.root(), &hide_uncovered, false);
    assert!(!text.contains("src/Untouched.php"), "{text}");

    let summary_only = CoverageOptions {
        show_only_summary: true,
        ..CoverageOptions::default()
    };
    let text = report::render_text(&acc, project.root(), &summary_only, false);
    assert!(!text.contains("src/Covered.php"), "{text}");
    assert!(text.contains("Summary"), "{text}");
    Ok(())
}

#[test]
fn decorated_text_report_uses_ansi() -> TestResult {
    let project = Project::new()?;
    let acc = sample(&project)?;

    let text = report::render_text(&acc, project.root(), &CoverageOptions::default(), true);
    assert!(text.contains('\u{1b}'));
    Ok(())
}

#[test]
fn html_report_writes_index_and_escaped_pages() -> TestResult {
    let project = Project::new()?;
    let acc = sample(&project)?;
    let target = project.dir("build/coverage")?;

    report::write_html(&acc, project.root(), &CoverageOptions::default(), &target)?;

    let index = fs::read_to_string(target.join("index.html"))?;
    assert!(index.contains("src/Covered.php"));
    assert!(index.contains("66.67%"));

    let page = fs::read_to_string(target.join("src/Untouched.php.html"))?;
    assert!(page.contains("$a &lt; $b"));
    assert!(!page.contains("$a < $b"));

    let covered = fs::read_to_string(target.join("src/Covered.php.html"))?;
    assert!(covered.contains("FooTest::testBar"));
    Ok(())
}

#[test]
fn clover_report_is_well_formed() -> TestResult {
    let project = Project::new()?;
    let acc = sample(&project)?;
    let target = project.path("clover.xml");

    report::write_clover(&acc, &target)?;

    let xml = fs::read_to_string(&target)?;
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<coverage generated="));
    assert!(xml.contains(&format!(
        "<file name=\"{}\">",
        project.path("src/Covered.php").display()
    )));
    assert!(xml.contains("<line num=\"2\" type=\"stmt\" count=\"1\"/>"));
    assert!(xml.contains("<line num=\"2\" type=\"stmt\" count=\"0\"/>"));
    assert!(xml.contains("files=\"2\""));
    assert!(xml.trim_end().ends_with("</coverage>"));
    assert!(Path::new(&target).is_file());
    Ok(())
}

#[test]
fn html_pages_for_outside_files_stay_in_the_report_dir() -> TestResult {
    let project = Project::new()?;
    let elsewhere = tempfile::tempdir()?;
    let outside = elsewhere.path().canonicalize()?.join("Lib.php");
    fs::write(&outside, "<?php\necho 1;\n")?;

    let mut data = RawCoverage::new();
    data.insert(outside.clone(), [(2, 1)].into_iter().collect());
    let mut acc = Accumulator::new();
    acc.append("LibTest::testIt", data, true);

    let target = project.dir("build/coverage")?;
    report::write_html(&acc, project.root(), &CoverageOptions::default(), &target)?;

    let stray = outside.with_file_name("Lib.php.html");
    assert!(!stray.exists(), "page written next to the source: {stray:?}");

    let pages = find_pages(&target.join(report::EXTERNAL_PAGES_DIR), "Lib.php.html")?;
    assert_eq!(pages.len(), 1, "{pages:?}");
    assert!(fs::read_to_string(&pages[0])?.contains("LibTest::testIt"));
    Ok(())
}

fn find_pages(dir: &Path, name: &str) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            found.extend(find_pages(&path, name)?);
        } else if path.file_name().is_some_and(|n| n == name) {
            found.push(path);
        }
    }
    Ok(found)
}
