// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::CompiledConfig;
use crate::errors::{PhpGuardError, Result};

/// Preferred config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "phpguard.yml";

/// Fallback used when [`CONFIG_FILE`] is absent.
pub const DIST_CONFIG_FILE: &str = "phpguard.yml.dist";

/// Turns a config file into the option trees the rest of the crate consumes.
pub trait ConfigCompiler {
    fn compile_file(&mut self, path: &Path) -> Result<CompiledConfig>;
}

/// Default compiler: reads the file as YAML.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCompiler;

impl ConfigCompiler for YamlCompiler {
    fn compile_file(&mut self, path: &Path) -> Result<CompiledConfig> {
        load_from_path(path)
    }
}

/// Locate the config file in `dir`: `phpguard.yml`, then `phpguard.yml.dist`.
pub fn resolve_config_path(dir: &Path) -> Result<PathBuf> {
    [CONFIG_FILE, DIST_CONFIG_FILE]
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| PhpGuardError::ConfigNotFound(dir.to_path_buf()))
}

/// Read and deserialize a YAML config file.
///
/// This only performs deserialization. Semantic checks (patterns present,
/// plugins and linters known) live in `config::validate`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<CompiledConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(?path, bytes = contents.len(), "read config file");
    load_from_str(&contents)
}

/// Parse YAML text. An empty document yields the default config.
pub fn load_from_str(contents: &str) -> Result<CompiledConfig> {
    let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
    if value.is_null() {
        return Ok(CompiledConfig::default());
    }
    Ok(serde_yaml::from_value(value)?)
}
