// src/engine/events.rs

//! Hook names and the payloads dispatched through them.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::model::CompiledConfig;
use crate::engine::result::EvalResult;
use crate::types::ChangeSet;

/// Named hook points of the evaluation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hook {
    PreLoadConfig,
    PostLoadConfig,
    PreEvaluate,
    PostEvaluate,
    PreRunAll,
    PostRunAll,
}

impl Hook {
    pub const ALL: [Hook; 6] = [
        Hook::PreLoadConfig,
        Hook::PostLoadConfig,
        Hook::PreEvaluate,
        Hook::PostEvaluate,
        Hook::PreRunAll,
        Hook::PostRunAll,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Hook::PreLoadConfig => "preLoadConfig",
            Hook::PostLoadConfig => "postLoadConfig",
            Hook::PreEvaluate => "preEvaluate",
            Hook::PostEvaluate => "postEvaluate",
            Hook::PreRunAll => "preRunAll",
            Hook::PostRunAll => "postRunAll",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of `PreLoadConfig` / `PostLoadConfig`.
///
/// `config` is `None` before compilation and set for `PostLoadConfig`.
#[derive(Debug, Clone)]
pub struct ConfigEvent {
    pub file: PathBuf,
    pub config: Option<Arc<CompiledConfig>>,
}

/// Payload of one evaluation cycle.
#[derive(Debug, Clone)]
pub struct EvaluateEvent {
    changeset: ChangeSet,
    results: Vec<EvalResult>,
}

impl EvaluateEvent {
    pub fn new(changeset: ChangeSet) -> Self {
        Self {
            changeset,
            results: Vec::new(),
        }
    }

    pub fn changeset(&self) -> &ChangeSet {
        &self.changeset
    }
}

/// Payload of an explicit full-suite run.
#[derive(Debug, Clone, Default)]
pub struct RunAllEvent {
    results: Vec<EvalResult>,
}

/// What a hook carries.
#[derive(Debug, Clone)]
pub enum Event {
    Config(ConfigEvent),
    Evaluate(EvaluateEvent),
    RunAll(RunAllEvent),
}

impl Event {
    pub fn changeset(&self) -> Option<&ChangeSet> {
        match self {
            Event::Evaluate(e) => Some(&e.changeset),
            _ => None,
        }
    }

    pub fn config(&self) -> Option<&CompiledConfig> {
        match self {
            Event::Config(c) => c.config.as_deref(),
            _ => None,
        }
    }

    /// Results gathered so far. Config events never carry results.
    pub fn results(&self) -> &[EvalResult] {
        match self {
            Event::Evaluate(e) => &e.results,
            Event::RunAll(r) => &r.results,
            Event::Config(_) => &[],
        }
    }

    /// Append a result. Ignored for config events, which have no results.
    pub fn push_result(&mut self, result: EvalResult) {
        match self {
            Event::Evaluate(e) => e.results.push(result),
            Event::RunAll(r) => r.results.push(result),
            Event::Config(_) => {}
        }
    }
}
