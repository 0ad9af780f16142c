// src/engine/context.rs

//! The component set every pipeline handler can reach.

use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use crate::coverage::CoverageSession;
use crate::lint::LinterRegistry;

/// Flags coming from the command line rather than the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputOptions {
    /// `--coverage`: force coverage on regardless of the config.
    pub coverage: bool,
    /// `--tags`: only rules sharing one of these tags take part.
    pub tags: Vec<String>,
    /// `--group`: only rules in this group take part.
    pub group: Option<String>,
}

/// Where user-facing output (coverage text report, run summaries) goes.
pub struct Console {
    writer: Box<dyn Write>,
    decorated: bool,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("decorated", &self.decorated)
            .finish_non_exhaustive()
    }
}

impl Console {
    pub fn new(writer: Box<dyn Write>, decorated: bool) -> Self {
        Self { writer, decorated }
    }

    /// Stdout, decorated when it is a terminal.
    pub fn stdout() -> Self {
        let decorated = io::stdout().is_terminal();
        Self::new(Box::new(io::stdout()), decorated)
    }

    pub fn is_decorated(&self) -> bool {
        self.decorated
    }

    pub fn writeln(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{text}")?;
        self.writer.flush()
    }
}

/// Components wired once at startup and handed to every handler.
#[derive(Debug)]
pub struct Context {
    /// Base directory for config discovery and rule matching.
    pub cwd: PathBuf,
    pub coverage: CoverageSession,
    pub linters: LinterRegistry,
    pub input: InputOptions,
    pub console: Console,
}

impl Context {
    pub fn new(cwd: impl Into<PathBuf>, coverage: CoverageSession) -> Self {
        Self {
            cwd: cwd.into(),
            coverage,
            linters: LinterRegistry::with_defaults(),
            input: InputOptions::default(),
            console: Console::stdout(),
        }
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn with_input(mut self, input: InputOptions) -> Self {
        self.input = input;
        self
    }

    pub fn with_linters(mut self, linters: LinterRegistry) -> Self {
        self.linters = linters;
        self
    }
}
