// src/config/validate.rs

use crate::config::model::CompiledConfig;
use crate::errors::{PhpGuardError, Result};
use crate::lint::LinterRegistry;
use crate::watch::compile_pattern;

/// Semantic checks run right after compilation, before `postLoadConfig`.
pub fn validate_config(
    cfg: &CompiledConfig,
    known_plugins: &[&str],
    linters: &LinterRegistry,
) -> Result<()> {
    validate_plugin_sections(cfg, known_plugins)?;
    validate_watch_rules(cfg, linters)?;
    Ok(())
}

fn validate_plugin_sections(cfg: &CompiledConfig, known_plugins: &[&str]) -> Result<()> {
    for name in cfg.plugins.keys() {
        if !known_plugins.contains(&name.as_str()) {
            return Err(PhpGuardError::ConfigError(format!(
                "unknown plugin section '{name}' (known: {})",
                known_plugins.join(", ")
            )));
        }
    }
    Ok(())
}

fn validate_watch_rules(cfg: &CompiledConfig, linters: &LinterRegistry) -> Result<()> {
    for (plugin, section) in cfg.plugins.iter() {
        for (idx, spec) in section.watch.iter().enumerate() {
            let pattern = match spec.pattern.as_deref().map(str::trim) {
                Some(p) if !p.is_empty() => p,
                _ => {
                    return Err(PhpGuardError::ConfigError(format!(
                        "{plugin}.watch[{idx}] requires a non-empty `pattern`"
                    )));
                }
            };

            compile_pattern(pattern).map_err(|e| {
                PhpGuardError::ConfigError(format!("{plugin}.watch[{idx}]: {e}"))
            })?;

            if let Some(lint) = &spec.lint {
                if !linters.has(lint) {
                    return Err(PhpGuardError::UnknownLinter(lint.clone()));
                }
            }
        }
    }
    Ok(())
}
