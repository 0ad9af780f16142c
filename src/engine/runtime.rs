// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::RuntimeEvent;
use crate::engine::guard::PhpGuard;
use crate::engine::result::{EvalResult, ResultStatus};
use crate::errors::Result;

/// Feeds runtime events into a [`PhpGuard`], one at a time.
///
/// The guard and its handlers are synchronous. `run` executes each step via
/// `block_in_place`, so it needs the multi-threaded tokio runtime. Events
/// arriving during a step wait in the channel.
pub struct Runtime {
    guard: PhpGuard,
    event_rx: mpsc::Receiver<RuntimeEvent>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

/// Counts per status, for the end-of-cycle log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub broken: usize,
    pub errors: usize,
}

impl CycleSummary {
    pub fn of(results: &[EvalResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.status() {
                ResultStatus::Succeeded => summary.succeeded += 1,
                ResultStatus::Failed => summary.failed += 1,
                ResultStatus::Broken => summary.broken += 1,
                ResultStatus::Error => summary.errors += 1,
            }
        }
        summary
    }

    pub fn is_green(&self) -> bool {
        self.failed == 0 && self.broken == 0 && self.errors == 0
    }
}

impl Runtime {
    pub fn new(guard: PhpGuard, event_rx: mpsc::Receiver<RuntimeEvent>) -> Self {
        Self { guard, event_rx }
    }

    pub fn guard(&self) -> &PhpGuard {
        &self.guard
    }

    pub fn into_guard(self) -> PhpGuard {
        self.guard
    }

    /// Main event loop. Returns when shutdown is requested or every sender
    /// is gone.
    pub async fn run(mut self) -> Result<()> {
        info!("phpguard runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");
            let keep_running = tokio::task::block_in_place(|| self.step(event));
            if !keep_running {
                break;
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Handle one event synchronously. False means stop.
    ///
    /// Configuration failures abort the current cycle only; the daemon keeps
    /// watching so the user can fix the file.
    pub fn step(&mut self, event: RuntimeEvent) -> bool {
        match event {
            RuntimeEvent::FilesChanged(changes) => {
                let config_changed = self
                    .guard
                    .config_file()
                    .is_some_and(|file| changes.contains(file));
                if config_changed {
                    info!("configuration file changed; reloading");
                    if let Err(err) = self.guard.load_configuration(true) {
                        error!("{err}");
                        return true;
                    }
                }
                report(self.guard.listen(changes));
                true
            }
            RuntimeEvent::RunAllRequested => {
                report(self.guard.run_all());
                true
            }
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested");
                false
            }
        }
    }
}

fn report(outcome: Result<Vec<EvalResult>>) {
    match outcome {
        Ok(results) if results.is_empty() => debug!("cycle produced no results"),
        Ok(results) => {
            let summary = CycleSummary::of(&results);
            if summary.is_green() {
                info!(succeeded = summary.succeeded, "cycle finished");
            } else {
                warn!(
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    broken = summary.broken,
                    errors = summary.errors,
                    "cycle finished with failures"
                );
            }
        }
        Err(err) => error!("{err}"),
    }
}
