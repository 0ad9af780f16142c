// src/watch/mod.rs

//! File watching and rule matching.
//!
//! This module is responsible for:
//! - Compiling watch rules and matching changed paths against them.
//! - Compiling the global `ignores` globs.
//! - Wiring up a cross-platform filesystem watcher (`notify`) that emits
//!   debounced change sets.
//!
//! It does **not** run anything; plugins decide what a match means.

pub mod path_utils;
pub mod patterns;
pub mod rule;
pub mod watcher;

pub use patterns::IgnoreSet;
pub use rule::{FileRef, MatchedFile, WatchRule, compile_pattern};
pub use watcher::{WatcherHandle, spawn_watcher};
