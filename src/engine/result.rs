// src/engine/result.rs

//! Outcome of one evaluated unit.

use std::backtrace::Backtrace;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::{PhpGuardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultStatus {
    Succeeded,
    Failed,
    Broken,
    Error,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultStatus::Succeeded => "succeeded",
            ResultStatus::Failed => "failed",
            ResultStatus::Broken => "broken",
            ResultStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Why a unit broke or errored.
pub type Cause = Arc<anyhow::Error>;

/// Result of evaluating one unit (a test run, a lint, ...).
///
/// Arguments are fixed once the value is built. Broken and errored results
/// always carry a cause; the factories take it by value.
#[derive(Debug, Clone)]
pub struct EvalResult {
    status: ResultStatus,
    name: String,
    arguments: BTreeMap<String, Value>,
    cause: Option<Cause>,
    trace: Vec<String>,
}

impl EvalResult {
    pub fn succeeded(name: impl Into<String>) -> Self {
        Self::plain(ResultStatus::Succeeded, name.into())
    }

    pub fn failed(name: impl Into<String>) -> Self {
        Self::plain(ResultStatus::Failed, name.into())
    }

    pub fn broken(name: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            cause: Some(Arc::new(cause.into())),
            ..Self::plain(ResultStatus::Broken, name.into())
        }
    }

    /// Build an error result. Without `trace`, the caller's location and the
    /// current backtrace are recorded, so the trace is never empty.
    #[track_caller]
    pub fn errored(
        name: impl Into<String>,
        arguments: BTreeMap<String, Value>,
        cause: impl Into<anyhow::Error>,
        trace: Option<Vec<String>>,
    ) -> Self {
        let trace = match trace {
            Some(t) => t,
            None => capture_trace(Location::caller()),
        };
        Self {
            status: ResultStatus::Error,
            name: name.into(),
            arguments,
            cause: Some(Arc::new(cause.into())),
            trace,
        }
    }

    fn plain(status: ResultStatus, name: String) -> Self {
        Self {
            status,
            name,
            arguments: BTreeMap::new(),
            cause: None,
            trace: Vec::new(),
        }
    }

    /// Attach arguments while building the result.
    pub fn with_arguments<I, K>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.arguments
            .extend(arguments.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    pub fn status(&self) -> ResultStatus {
        self.status
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_succeed(&self) -> bool {
        self.status == ResultStatus::Succeeded
    }

    pub fn is_failed(&self) -> bool {
        self.status == ResultStatus::Failed
    }

    pub fn is_broken(&self) -> bool {
        self.status == ResultStatus::Broken
    }

    pub fn is_error(&self) -> bool {
        self.status == ResultStatus::Error
    }

    pub fn argument(&self, key: &str) -> Result<&Value> {
        self.arguments
            .get(key)
            .ok_or_else(|| PhpGuardError::UnknownArgument(key.to_string()))
    }

    pub fn arguments(&self) -> &BTreeMap<String, Value> {
        &self.arguments
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_deref()
    }

    pub fn trace(&self) -> &[String] {
        &self.trace
    }
}

fn capture_trace(caller: &Location<'_>) -> Vec<String> {
    let mut frames = vec![format!("{}:{}:{}", caller.file(), caller.line(), caller.column())];
    frames.extend(
        Backtrace::force_capture()
            .to_string()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string),
    );
    frames
}
