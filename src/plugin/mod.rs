// src/plugin/mod.rs

//! Test-runner plugins.
//!
//! A plugin is a pipeline subscriber keyed by name; its config section has
//! the same name. The built-in ones wrap a command line.

pub mod command;

pub use command::CommandPlugin;

/// The plugins a default `phpguard` binary knows about.
pub fn default_plugins() -> Vec<CommandPlugin> {
    vec![CommandPlugin::phpunit(), CommandPlugin::phpspec()]
}
