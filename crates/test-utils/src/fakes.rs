//! Test doubles for the crate's seams: command runner, linter, coverage
//! driver, config compiler, console writer, and a subscriber that records
//! what it saw.
//!
//! Each fake is `Clone` and shares its state, so a test keeps one copy for
//! assertions after handing the other to the code under test.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use phpguard::config::{CompiledConfig, ConfigCompiler, YamlCompiler};
use phpguard::coverage::{CoverageDriver, RawCoverage};
use phpguard::engine::{Context, Event, Hook, Subscriber};
use phpguard::errors::Result;
use phpguard::exec::{CommandLine, CommandRunner};
use phpguard::lint::Linter;

/// Records invocations and answers with a fixed exit code, or a spawn error.
#[derive(Clone)]
pub struct FakeRunner {
    calls: Arc<Mutex<Vec<CommandLine>>>,
    exit_code: Option<i32>,
}

impl FakeRunner {
    pub fn exiting_with(code: i32) -> Self {
        Self {
            calls: Arc::default(),
            exit_code: Some(code),
        }
    }

    /// A runner whose process can never be started.
    pub fn unspawnable() -> Self {
        Self {
            calls: Arc::default(),
            exit_code: None,
        }
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&mut self, cmd: &CommandLine, _cwd: &Path) -> io::Result<i32> {
        self.calls.lock().unwrap().push(cmd.clone());
        self.exit_code
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such runner"))
    }
}

/// Linter with a fixed verdict that remembers which files it checked.
#[derive(Clone)]
pub struct FakeLinter {
    name: String,
    verdict: bool,
    checked: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeLinter {
    pub fn new(name: &str, verdict: bool) -> Self {
        Self {
            name: name.to_string(),
            verdict,
            checked: Arc::default(),
        }
    }

    pub fn checked(&self) -> Vec<PathBuf> {
        self.checked.lock().unwrap().clone()
    }
}

impl Linter for FakeLinter {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, path: &Path) -> bool {
        self.checked.lock().unwrap().push(path.to_path_buf());
        self.verdict
    }
}

/// Coverage driver returning the same canned data on every `stop`.
#[derive(Clone, Default)]
pub struct FakeDriver {
    data: RawCoverage,
    starts: Arc<AtomicUsize>,
}

impl FakeDriver {
    pub fn new(data: RawCoverage) -> Self {
        Self {
            data,
            starts: Arc::default(),
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl CoverageDriver for FakeDriver {
    fn start(&mut self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&mut self) -> RawCoverage {
        self.data.clone()
    }
}

/// YAML compiler that counts how often it ran.
#[derive(Clone, Default)]
pub struct CountingCompiler {
    count: Arc<AtomicUsize>,
}

impl CountingCompiler {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ConfigCompiler for CountingCompiler {
    fn compile_file(&mut self, path: &Path) -> Result<CompiledConfig> {
        self.count.fetch_add(1, Ordering::SeqCst);
        YamlCompiler.compile_file(path)
    }
}

/// In-memory console target.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One hook invocation seen by a [`RecordingSubscriber`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub subscriber: String,
    pub hook: Hook,
    pub files: Vec<PathBuf>,
}

/// Subscriber that appends a [`Record`] to a shared log for every hook.
#[derive(Clone)]
pub struct RecordingSubscriber {
    name: String,
    subscriptions: Vec<(Hook, i32)>,
    log: Arc<Mutex<Vec<Record>>>,
}

impl RecordingSubscriber {
    pub fn new(name: &str, subscriptions: Vec<(Hook, i32)>, log: Arc<Mutex<Vec<Record>>>) -> Self {
        Self {
            name: name.to_string(),
            subscriptions,
            log,
        }
    }

    /// Subscribed to every hook at `priority`.
    pub fn everywhere(name: &str, priority: i32, log: Arc<Mutex<Vec<Record>>>) -> Self {
        Self::new(
            name,
            Hook::ALL.iter().map(|h| (*h, priority)).collect(),
            log,
        )
    }
}

impl Subscriber for RecordingSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn subscriptions(&self) -> Vec<(Hook, i32)> {
        self.subscriptions.clone()
    }

    fn handle(&mut self, hook: Hook, event: &mut Event, _ctx: &mut Context) -> Result<()> {
        let files = event
            .changeset()
            .map(|cs| cs.files().to_vec())
            .unwrap_or_default();
        self.log.lock().unwrap().push(Record {
            subscriber: self.name.clone(),
            hook,
            files,
        });
        Ok(())
    }
}
