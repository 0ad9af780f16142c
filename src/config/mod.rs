// src/config/mod.rs

//! Configuration loading and validation for phpguard.
//!
//! Responsibilities:
//! - Define the YAML-backed data model (`model.rs`).
//! - Locate and compile the config file (`loader.rs`).
//! - Validate rule and plugin invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    CONFIG_FILE, ConfigCompiler, DIST_CONFIG_FILE, YamlCompiler, load_from_path, load_from_str,
    resolve_config_path,
};
pub use model::{CompiledConfig, GuardSection, PluginOptions, PluginSection, WatchSpec};
pub use validate::validate_config;
