use std::path::{Path, PathBuf};
use std::time::Duration;

/// One debounced batch of changed files.
///
/// Paths are absolute and keep the order in which the watcher first saw
/// them. A `ChangeSet` cannot be modified once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    files: Vec<PathBuf>,
}

impl ChangeSet {
    /// Build a change set, dropping duplicate paths but keeping first-seen order.
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut out: Vec<PathBuf> = Vec::new();
        for f in files {
            let f = f.into();
            if !out.contains(&f) {
                out.push(f);
            }
        }
        Self { files: out }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f == path)
    }
}

/// Options from the `phpguard:` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOptions {
    /// Glob patterns (relative to the working dir) the watcher ignores.
    pub ignores: Vec<String>,
    /// Debounce window in microseconds.
    pub latency: u64,
}

pub const DEFAULT_LATENCY_MICROS: u64 = 1_000_000;

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            ignores: Vec::new(),
            latency: DEFAULT_LATENCY_MICROS,
        }
    }
}

impl GuardOptions {
    pub fn latency_duration(&self) -> Duration {
        Duration::from_micros(self.latency)
    }
}
