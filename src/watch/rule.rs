// src/watch/rule.rs

//! Watch rules: decide whether a changed file concerns a plugin, and which
//! file it should be reported as.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::config::model::WatchSpec;
use crate::errors::{PhpGuardError, Result};
use crate::lint::LinterRegistry;
use crate::watch::path_utils::{absolutize, relative_str};

/// A file that satisfied a rule.
///
/// When the rule has a `transform`, this is the *target* file, not the file
/// that changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchedFile {
    path: PathBuf,
    relative: String,
}

impl MatchedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the rule's base directory, `/`-separated.
    pub fn relative_path_name(&self) -> &str {
        &self.relative
    }
}

/// Something `match_file` can be asked about: a plain path, or a file that
/// was already resolved by an earlier match.
#[derive(Debug, Clone)]
pub enum FileRef {
    Raw(PathBuf),
    Resolved(MatchedFile),
}

impl From<&Path> for FileRef {
    fn from(p: &Path) -> Self {
        FileRef::Raw(p.to_path_buf())
    }
}

impl From<PathBuf> for FileRef {
    fn from(p: PathBuf) -> Self {
        FileRef::Raw(p)
    }
}

impl From<&PathBuf> for FileRef {
    fn from(p: &PathBuf) -> Self {
        FileRef::Raw(p.clone())
    }
}

impl From<&str> for FileRef {
    fn from(p: &str) -> Self {
        FileRef::Raw(PathBuf::from(p))
    }
}

impl From<MatchedFile> for FileRef {
    fn from(m: MatchedFile) -> Self {
        FileRef::Resolved(m)
    }
}

impl From<&MatchedFile> for FileRef {
    fn from(m: &MatchedFile) -> Self {
        FileRef::Resolved(m.clone())
    }
}

impl FileRef {
    fn absolute(&self, base: &Path) -> PathBuf {
        match self {
            FileRef::Raw(p) => absolutize(base, p),
            FileRef::Resolved(m) => m.path.clone(),
        }
    }
}

/// A compiled `watch:` entry.
#[derive(Clone)]
pub struct WatchRule {
    base_dir: PathBuf,
    source: String,
    pattern: Regex,
    tags: BTreeSet<String>,
    groups: BTreeSet<String>,
    transform: Option<String>,
    lint: Option<String>,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("pattern", &self.source)
            .field("tags", &self.tags)
            .field("groups", &self.groups)
            .field("transform", &self.transform)
            .field("lint", &self.lint)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    /// Compile a rule. Relative paths are evaluated against `base_dir`.
    ///
    /// Fails with a configuration error when the pattern is missing or empty,
    /// and with [`PhpGuardError::PatternError`] when it does not compile.
    pub fn from_spec(spec: &WatchSpec, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let source = match spec.pattern.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => {
                return Err(PhpGuardError::ConfigError(
                    "watch rule requires a non-empty `pattern`".to_string(),
                ));
            }
        };

        Ok(Self {
            base_dir: base_dir.into(),
            pattern: compile_pattern(&source)?,
            source,
            tags: spec.tags.iter().cloned().collect(),
            groups: spec.groups.iter().cloned().collect(),
            transform: spec.transform.clone(),
            lint: spec.lint.clone(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn transform(&self) -> Option<&str> {
        self.transform.as_deref()
    }

    pub fn lint_id(&self) -> Option<&str> {
        self.lint.as_deref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Check a candidate file against this rule.
    ///
    /// Returns `None` when the file does not exist, the relative path does
    /// not match, or the transformed target does not exist.
    pub fn match_file(&self, candidate: impl Into<FileRef>) -> Option<MatchedFile> {
        let absolute = candidate.into().absolute(&self.base_dir);
        if !absolute.is_file() {
            return None;
        }

        let relative = relative_str(&self.base_dir, &absolute)?;
        if !self.pattern.is_match(&relative) {
            return None;
        }

        let Some(template) = &self.transform else {
            return Some(MatchedFile {
                path: absolute,
                relative,
            });
        };

        let target_rel = self.pattern.replace(&relative, template.as_str()).into_owned();
        let target = self.base_dir.join(&target_rel);
        if !target.is_file() {
            debug!(
                source = %relative,
                target = %target_rel,
                "transform target does not exist"
            );
            return None;
        }

        Some(MatchedFile {
            path: target,
            relative: target_rel.replace('\\', "/"),
        })
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains(name)
    }

    /// ANY semantics: true when `query` is empty or shares a tag with the rule.
    pub fn has_tags<I, S>(&self, query: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut empty = true;
        for tag in query {
            empty = false;
            if self.tags.contains(tag.as_ref()) {
                return true;
            }
        }
        empty
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
    }

    /// Run the rule's linter against `path`.
    ///
    /// A rule without `lint` always passes. An identifier missing from the
    /// registry is a configuration error, not a failed lint.
    pub fn lint(&self, path: &Path, linters: &LinterRegistry) -> Result<bool> {
        let Some(id) = &self.lint else {
            return Ok(true);
        };
        let linter = linters
            .get(id)
            .ok_or_else(|| PhpGuardError::UnknownLinter(id.clone()))?;
        let passed = linter.check(path);
        debug!(linter = %linter.name(), ?path, passed, "lint finished");
        Ok(passed)
    }
}

const DELIMITERS: &[char] = &['#', '/', '~', '!', '@', '%'];

/// Compile a rule pattern.
///
/// Patterns written with PHP-style delimiters (`#^src/.*$#i`) have their
/// delimiters stripped; trailing `i`, `m`, `s`, `x` flags are honoured and
/// `u` is accepted and ignored.
pub fn compile_pattern(source: &str) -> Result<Regex> {
    let (body, flags) = split_delimited(source).unwrap_or((source, ""));

    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            _ => &mut builder,
        };
    }
    Ok(builder.build()?)
}

fn split_delimited(source: &str) -> Option<(&str, &str)> {
    let first = source.chars().next()?;
    if !DELIMITERS.contains(&first) || source.len() < 2 {
        return None;
    }
    let close = source.rfind(first)?;
    if close == 0 {
        return None;
    }
    let flags = &source[close + 1..];
    if !flags.chars().all(|c| "imsxu".contains(c)) {
        return None;
    }
    Some((&source[1..close], flags))
}
