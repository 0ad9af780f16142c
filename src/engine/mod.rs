// src/engine/mod.rs

//! Evaluation engine for phpguard.
//!
//! This module ties together:
//! - the result model produced by every evaluated unit ([`result`])
//! - hook names and event payloads ([`events`])
//! - the shared component set handlers receive ([`context`])
//! - the priority-ordered dispatcher ([`dispatcher`])
//! - the orchestrator that turns change sets into cycles ([`guard`])
//! - the async loop feeding the orchestrator ([`runtime`])

use crate::types::ChangeSet;

/// Events flowing into the runtime from the watcher and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// One debounced batch of changed files.
    FilesChanged(ChangeSet),
    /// Run every active plugin's full suite.
    RunAllRequested,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod context;
pub mod dispatcher;
pub mod events;
pub mod guard;
pub mod result;
pub mod runtime;

pub use context::{Console, Context, InputOptions};
pub use dispatcher::{Dispatcher, DispatcherBuilder, Subscriber};
pub use events::{ConfigEvent, EvaluateEvent, Event, Hook, RunAllEvent};
pub use guard::{PhpGuard, PhpGuardBuilder};
pub use result::{Cause, EvalResult, ResultStatus};
pub use runtime::{CycleSummary, Runtime};
