// src/coverage/filter.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Include / exclude sets deciding which source files coverage reports on.
///
/// When any whitelist entry exists, only whitelisted files count and the
/// blacklist is not consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageFilter {
    whitelist_dirs: BTreeSet<PathBuf>,
    blacklist_dirs: BTreeSet<PathBuf>,
    whitelist_files: BTreeSet<PathBuf>,
    blacklist_files: BTreeSet<PathBuf>,
}

impl CoverageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_directory_to_whitelist(&mut self, dir: impl Into<PathBuf>) {
        self.whitelist_dirs.insert(dir.into());
    }

    pub fn add_directory_to_blacklist(&mut self, dir: impl Into<PathBuf>) {
        self.blacklist_dirs.insert(dir.into());
    }

    pub fn add_file_to_whitelist(&mut self, file: impl Into<PathBuf>) {
        self.whitelist_files.insert(file.into());
    }

    pub fn add_file_to_blacklist(&mut self, file: impl Into<PathBuf>) {
        self.blacklist_files.insert(file.into());
    }

    pub fn has_whitelist(&self) -> bool {
        !self.whitelist_dirs.is_empty() || !self.whitelist_files.is_empty()
    }

    /// True when `file` must be left out of coverage data.
    pub fn is_filtered(&self, file: &Path) -> bool {
        if self.has_whitelist() {
            return !(self.whitelist_files.contains(file)
                || self.whitelist_dirs.iter().any(|d| file.starts_with(d)));
        }
        self.blacklist_files.contains(file) || self.blacklist_dirs.iter().any(|d| file.starts_with(d))
    }
}
