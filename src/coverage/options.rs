// src/coverage/options.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::errors::{PhpGuardError, Result};
use crate::watch::path_utils::absolutize;

/// `phpguard.coverage` section.
///
/// Keys keep their config spelling (`output.html`, ...). Output paths are
/// only trustworthy after [`CoverageOptions::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageOptions {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub whitelist: Vec<PathBuf>,
    #[serde(default)]
    pub blacklist: Vec<PathBuf>,
    #[serde(default)]
    pub whitelist_files: Vec<PathBuf>,
    #[serde(default)]
    pub blacklist_files: Vec<PathBuf>,

    #[serde(default = "default_true")]
    pub show_uncovered_files: bool,
    #[serde(default = "default_lower_upper_bound")]
    pub lower_upper_bound: u32,
    #[serde(default = "default_high_lower_bound")]
    pub high_lower_bound: u32,
    #[serde(default)]
    pub show_only_summary: bool,

    /// Directory for the HTML report. `false` or absent disables it.
    #[serde(rename = "output.html", default, deserialize_with = "path_or_false")]
    pub output_html: Option<PathBuf>,
    /// File for the Clover XML report. `false` or absent disables it.
    #[serde(rename = "output.clover", default, deserialize_with = "path_or_false")]
    pub output_clover: Option<PathBuf>,
    #[serde(rename = "output.text", default)]
    pub output_text: bool,

    /// Set from the command line at config post-load.
    #[serde(rename = "input.option.enabled", default)]
    pub input_enabled: bool,
}

fn default_true() -> bool {
    true
}

fn default_lower_upper_bound() -> u32 {
    35
}

fn default_high_lower_bound() -> u32 {
    70
}

impl Default for CoverageOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            whitelist_files: Vec::new(),
            blacklist_files: Vec::new(),
            show_uncovered_files: true,
            lower_upper_bound: default_lower_upper_bound(),
            high_lower_bound: default_high_lower_bound(),
            show_only_summary: false,
            output_html: None,
            output_clover: None,
            output_text: false,
            input_enabled: false,
        }
    }
}

impl CoverageOptions {
    pub fn has_output(&self) -> bool {
        self.output_text || self.output_html.is_some() || self.output_clover.is_some()
    }

    /// Resolve output paths against `cwd` and check them.
    ///
    /// - The parent of each output must already exist, otherwise this is a
    ///   configuration error.
    /// - The HTML directory itself is created when missing.
    /// - Stored paths are canonical and absolute.
    pub fn normalize(&mut self, cwd: &Path) -> Result<()> {
        if let Some(html) = self.output_html.take() {
            let target = absolutize(cwd, &html);
            ensure_parent_dir(&target, "html")?;
            if !target.is_dir() {
                fs::create_dir_all(&target)?;
                debug!(?target, "created coverage html directory");
            }
            self.output_html = Some(target.canonicalize()?);
        }

        if let Some(clover) = self.output_clover.take() {
            let target = absolutize(cwd, &clover);
            let parent = ensure_parent_dir(&target, "clover")?;
            let file_name = target.file_name().ok_or_else(|| {
                PhpGuardError::ConfigError(format!(
                    "coverage clover output {target:?} must name a file"
                ))
            })?;
            self.output_clover = Some(parent.canonicalize()?.join(file_name));
        }

        Ok(())
    }
}

fn ensure_parent_dir<'a>(target: &'a Path, kind: &str) -> Result<&'a Path> {
    match target.parent() {
        Some(dir) if dir.is_dir() => Ok(dir),
        parent => Err(PhpGuardError::ConfigError(format!(
            "Can not output coverage {kind} to: {target:?}. Please ensure that directory {:?} exists and is readable",
            parent.unwrap_or(target)
        ))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PathOrBool {
    Path(PathBuf),
    Bool(bool),
}

fn path_or_false<'de, D>(deserializer: D) -> std::result::Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<PathOrBool> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(PathOrBool::Path(p)) if !p.as_os_str().is_empty() => Some(p),
        _ => None,
    })
}
