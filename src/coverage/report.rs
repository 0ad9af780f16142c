// src/coverage/report.rs

//! Coverage renderers: text summary, HTML tree and Clover XML.
//!
//! Each renderer only reads the accumulator. Paths shown to the user are
//! relative to the project base directory when possible.

use std::fmt::Write as _;
use std::fs;
use std::io::BufWriter;
use std::path::{Component, Path, PathBuf};

use chrono::Local;
use console::style;
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use tracing::debug;

use crate::coverage::accumulator::{Accumulator, LineTotals};
use crate::coverage::options::CoverageOptions;
use crate::errors::{PhpGuardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Low,
    Medium,
    High,
}

/// Classify a percentage against the configured bounds.
pub fn rate(percent: f64, options: &CoverageOptions) -> Rating {
    if percent < f64::from(options.lower_upper_bound) {
        Rating::Low
    } else if percent < f64::from(options.high_lower_bound) {
        Rating::Medium
    } else {
        Rating::High
    }
}

fn display_name(file: &Path, base_dir: &Path) -> String {
    file.strip_prefix(base_dir)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}

fn format_totals(totals: LineTotals) -> String {
    format!(
        "{:>6.2}% ({}/{})",
        totals.percent(),
        totals.covered,
        totals.executable
    )
}

fn colorize(text: String, rating: Rating, decorated: bool) -> String {
    if !decorated {
        return text;
    }
    let styled = match rating {
        Rating::Low => style(text).red(),
        Rating::Medium => style(text).yellow(),
        Rating::High => style(text).green(),
    };
    styled.force_styling(true).to_string()
}

/// Text report as written to the console.
pub fn render_text(
    accumulator: &Accumulator,
    base_dir: &Path,
    options: &CoverageOptions,
    decorated: bool,
) -> String {
    let totals = accumulator.totals();
    let mut out = String::new();

    let title = "Code Coverage Report:";
    if decorated {
        let _ = writeln!(out, "{}", style(title).bold().force_styling(true));
    } else {
        let _ = writeln!(out, "{title}");
    }
    let _ = writeln!(out, "  {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out);
    let _ = writeln!(out, " Summary:");
    let summary = format!("  Lines:  {}", format_totals(totals));
    let _ = writeln!(
        out,
        "{}",
        colorize(summary, rate(totals.percent(), options), decorated)
    );

    if options.show_only_summary {
        return out;
    }

    let _ = writeln!(out);
    for (file, _) in accumulator.files() {
        let file_totals = accumulator.file_totals(file);
        if !options.show_uncovered_files && file_totals.covered == 0 {
            continue;
        }
        let _ = writeln!(out, "{}", display_name(file, base_dir));
        let line = format!("  Lines:  {}", format_totals(file_totals));
        let _ = writeln!(
            out,
            "{}",
            colorize(line, rate(file_totals.percent(), options), decorated)
        );
    }

    out
}

fn rating_class(rating: Rating) -> &'static str {
    match rating {
        Rating::Low => "low",
        Rating::Medium => "medium",
        Rating::High => "high",
    }
}

/// Report subdirectory for pages of files outside the project.
pub const EXTERNAL_PAGES_DIR: &str = "_external";

const HTML_STYLE: &str = "body{font-family:sans-serif}table{border-collapse:collapse}\
td,th{padding:2px 8px;text-align:left}.low{background:#f2dede}.medium{background:#fcf8e3}\
.high{background:#dff0d8}.covered{background:#dff0d8}.uncovered{background:#f2dede}\
pre{margin:0}";

/// Page for one source file, relative to the report root.
///
/// Files outside `base_dir` go under `_external/`. Only normal components
/// are kept, so the page never escapes the report directory.
fn page_for(file: &Path, base_dir: &Path) -> PathBuf {
    let (mut page, rel) = match file.strip_prefix(base_dir) {
        Ok(rel) => (PathBuf::new(), rel),
        Err(_) => (PathBuf::from(EXTERNAL_PAGES_DIR), file),
    };
    page.extend(rel.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part),
        _ => None,
    }));
    let mut name = page.into_os_string();
    name.push(".html");
    PathBuf::from(name)
}

/// Write `index.html` plus one page per source file under `target`.
pub fn write_html(
    accumulator: &Accumulator,
    base_dir: &Path,
    options: &CoverageOptions,
    target: &Path,
) -> Result<()> {
    fs::create_dir_all(target)?;
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let mut rows = String::new();
    for (file, lines) in accumulator.files() {
        let totals = accumulator.file_totals(file);
        if !options.show_uncovered_files && totals.covered == 0 {
            continue;
        }
        let name = display_name(file, base_dir);
        let page = page_for(file, base_dir);
        let class = rating_class(rate(totals.percent(), options));

        let _ = writeln!(
            rows,
            "<tr class=\"{class}\"><td><a href=\"{href}\">{label}</a></td><td>{pct:.2}%</td><td>{covered}/{executable}</td></tr>",
            href = escape(&page.to_string_lossy().replace('\\', "/")),
            label = escape(&name),
            pct = totals.percent(),
            covered = totals.covered,
            executable = totals.executable,
        );

        let source = fs::read_to_string(file).unwrap_or_default();
        let mut body = String::new();
        for (idx, text) in source.lines().enumerate() {
            let num = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            let (class, title) = match lines.get(&num) {
                Some(ids) if !ids.is_empty() => (
                    "covered",
                    ids.iter().cloned().collect::<Vec<_>>().join(", "),
                ),
                Some(_) => ("uncovered", String::new()),
                None => ("", String::new()),
            };
            let _ = writeln!(
                body,
                "<tr class=\"{class}\" title=\"{}\"><td>{num}</td><td><pre>{}</pre></td></tr>",
                escape(&title),
                escape(text),
            );
        }

        let page_path = target.join(&page);
        if let Some(dir) = page_path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(
            &page_path,
            format!(
                "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title><style>{HTML_STYLE}</style></head>\n\
                 <body><h1>{title}</h1><p>Lines: {pct:.2}% ({covered}/{executable})</p>\n<table>\n{body}</table>\n\
                 <p>Generated on {generated}</p></body></html>\n",
                title = escape(&name),
                pct = totals.percent(),
                covered = totals.covered,
                executable = totals.executable,
            ),
        )?;
    }

    let totals = accumulator.totals();
    let index = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Code Coverage</title><style>{HTML_STYLE}</style></head>\n\
         <body><h1>Code Coverage</h1>\n<table>\n<tr><th>File</th><th>Lines</th><th></th></tr>\n\
         <tr class=\"{class}\"><td><strong>Total</strong></td><td>{pct:.2}%</td><td>{covered}/{executable}</td></tr>\n\
         {rows}</table>\n<p>Generated on {generated}</p></body></html>\n",
        class = rating_class(rate(totals.percent(), options)),
        pct = totals.percent(),
        covered = totals.covered,
        executable = totals.executable,
    );
    fs::write(target.join("index.html"), index)?;

    debug!(?target, "wrote html coverage report");
    Ok(())
}

fn xml_err(err: impl std::fmt::Display) -> PhpGuardError {
    PhpGuardError::ReportError(err.to_string())
}

fn metrics(totals: LineTotals) -> BytesStart<'static> {
    let mut el = BytesStart::new("metrics");
    let statements = totals.executable.to_string();
    let covered = totals.covered.to_string();
    el.push_attribute(("statements", statements.as_str()));
    el.push_attribute(("coveredstatements", covered.as_str()));
    el.push_attribute(("elements", statements.as_str()));
    el.push_attribute(("coveredelements", covered.as_str()));
    el
}

/// Write a Clover XML document to `target`.
pub fn write_clover(accumulator: &Accumulator, target: &Path) -> Result<()> {
    let file = fs::File::create(target)?;
    let mut writer = Writer::new_with_indent(BufWriter::new(file), b' ', 2);
    let timestamp = Local::now().timestamp().to_string();

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut coverage = BytesStart::new("coverage");
    coverage.push_attribute(("generated", timestamp.as_str()));
    writer.write_event(Event::Start(coverage)).map_err(xml_err)?;

    let mut project = BytesStart::new("project");
    project.push_attribute(("timestamp", timestamp.as_str()));
    writer.write_event(Event::Start(project)).map_err(xml_err)?;

    let mut file_count = 0usize;
    for (path, lines) in accumulator.files() {
        file_count += 1;
        let name = path.to_string_lossy();
        let mut file_el = BytesStart::new("file");
        file_el.push_attribute(("name", name.as_ref()));
        writer.write_event(Event::Start(file_el)).map_err(xml_err)?;

        for (num, ids) in lines {
            let num = num.to_string();
            let count = ids.len().to_string();
            let mut line = BytesStart::new("line");
            line.push_attribute(("num", num.as_str()));
            line.push_attribute(("type", "stmt"));
            line.push_attribute(("count", count.as_str()));
            writer.write_event(Event::Empty(line)).map_err(xml_err)?;
        }

        writer
            .write_event(Event::Empty(metrics(accumulator.file_totals(path))))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("file")))
            .map_err(xml_err)?;
    }

    let mut project_metrics = metrics(accumulator.totals());
    let files = file_count.to_string();
    project_metrics.push_attribute(("files", files.as_str()));
    writer
        .write_event(Event::Empty(project_metrics))
        .map_err(xml_err)?;

    writer
        .write_event(Event::End(BytesEnd::new("project")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("coverage")))
        .map_err(xml_err)?;

    std::io::Write::flush(writer.get_mut())?;
    debug!(?target, "wrote clover coverage report");
    Ok(())
}
