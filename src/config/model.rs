// src/config/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::coverage::CoverageOptions;
use crate::types::DEFAULT_LATENCY_MICROS;

/// Compiled configuration, as read from `phpguard.yml`.
///
/// ```yaml
/// phpguard:
///   ignores: ["vendor/**"]
///   latency: 500000
///   coverage:
///     enabled: true
///     output.text: true
///
/// phpunit:
///   options:
///     cli: "--colors"
///   watch:
///     - pattern: '#^src/(.+)\.php$#'
///       transform: "tests/${1}Test.php"
/// ```
///
/// Every top-level key other than `phpguard` is a plugin section, keyed by
/// plugin name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompiledConfig {
    #[serde(default)]
    pub phpguard: GuardSection,

    #[serde(flatten)]
    pub plugins: BTreeMap<String, PluginSection>,
}

impl CompiledConfig {
    pub fn plugin(&self, name: &str) -> Option<&PluginSection> {
        self.plugins.get(name)
    }
}

/// `phpguard:` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GuardSection {
    /// Globs the watcher ignores. A single string is accepted.
    #[serde(default, deserialize_with = "one_or_many")]
    pub ignores: Vec<String>,

    /// Debounce interval in microseconds.
    #[serde(default = "default_latency")]
    pub latency: u64,

    #[serde(default)]
    pub coverage: Option<CoverageOptions>,
}

fn default_latency() -> u64 {
    DEFAULT_LATENCY_MICROS
}

impl Default for GuardSection {
    fn default() -> Self {
        Self {
            ignores: Vec::new(),
            latency: default_latency(),
            coverage: None,
        }
    }
}

/// `<plugin>:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginSection {
    #[serde(default)]
    pub options: PluginOptions,

    #[serde(default)]
    pub watch: Vec<WatchSpec>,
}

/// `<plugin>.options`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginOptions {
    /// Overrides the plugin's default runner command.
    #[serde(default)]
    pub command: Option<String>,

    /// Extra arguments appended to every invocation.
    #[serde(default)]
    pub cli: Option<String>,

    /// Extra arguments for full-suite runs; falls back to `cli`.
    #[serde(default)]
    pub run_all_cli: Option<String>,

    /// Run the full suite once when the daemon starts.
    #[serde(default)]
    pub all_on_start: bool,
}

/// One entry of `<plugin>.watch`.
///
/// `pattern` is optional here only so that a missing pattern is reported as
/// a configuration error by `config::validate` instead of a serde message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSpec {
    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub groups: Vec<String>,

    #[serde(default)]
    pub transform: Option<String>,

    #[serde(default)]
    pub lint: Option<String>,
}

impl WatchSpec {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accept `key: value`, `key: [a, b]` or `key: ~`.
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<OneOrMany> = Option::deserialize(deserializer)?;
    Ok(match value {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}
