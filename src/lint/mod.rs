// src/lint/mod.rs

//! Per-file linters, looked up by identifier from watch rules.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub mod php;

pub use php::PhpLinter;

/// A syntax/style checker for a single file.
pub trait Linter {
    /// Identifier used in `lint: <name>`.
    fn name(&self) -> &str;

    /// Human-readable title for log lines.
    fn title(&self) -> &str {
        self.name()
    }

    /// True when the file passes.
    fn check(&self, path: &Path) -> bool;
}

/// Registered linters, keyed by [`Linter::name`].
#[derive(Default)]
pub struct LinterRegistry {
    linters: BTreeMap<String, Box<dyn Linter>>,
}

impl fmt::Debug for LinterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinterRegistry")
            .field("linters", &self.linters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LinterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in linters (`php`).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PhpLinter::default());
        registry
    }

    /// Add a linter, replacing any previous one with the same name.
    pub fn register(&mut self, linter: impl Linter + 'static) {
        self.linters.insert(linter.name().to_string(), Box::new(linter));
    }

    pub fn has(&self, id: &str) -> bool {
        self.linters.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&dyn Linter> {
        self.linters.get(id).map(|l| l.as_ref())
    }
}
