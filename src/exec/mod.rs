// src/exec/mod.rs

//! Process execution layer.
//!
//! Test runners are spawned synchronously from inside pipeline handlers.
//! [`backend`] holds the [`CommandRunner`] seam and the real
//! [`ProcessRunner`].

pub mod backend;

pub use backend::{CommandLine, CommandRunner, ProcessRunner};
