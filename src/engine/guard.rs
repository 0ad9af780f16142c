// src/engine/guard.rs

//! The orchestrator.
//!
//! [`PhpGuard`] owns the dispatcher, the config compiler and the context. It
//! turns a change set into one evaluation cycle and drives configuration
//! loading. It does no rule filtering itself; plugins do.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::loader::{ConfigCompiler, YamlCompiler, resolve_config_path};
use crate::config::model::CompiledConfig;
use crate::config::validate::validate_config;
use crate::coverage::CoverageListener;
use crate::engine::context::Context;
use crate::engine::dispatcher::{Dispatcher, DispatcherBuilder, Subscriber};
use crate::engine::events::{ConfigEvent, EvaluateEvent, Event, Hook, RunAllEvent};
use crate::engine::result::EvalResult;
use crate::errors::Result;
use crate::plugin::CommandPlugin;
use crate::types::{ChangeSet, GuardOptions};

pub struct PhpGuardBuilder {
    context: Context,
    compiler: Box<dyn ConfigCompiler>,
    dispatcher: DispatcherBuilder,
    plugin_names: Vec<String>,
}

impl PhpGuardBuilder {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            compiler: Box::new(YamlCompiler),
            dispatcher: DispatcherBuilder::new().subscriber(CoverageListener),
            plugin_names: Vec::new(),
        }
    }

    pub fn compiler(mut self, compiler: impl ConfigCompiler + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    /// Register a plugin. Its name becomes a valid config section.
    pub fn plugin(mut self, plugin: CommandPlugin) -> Self {
        self.plugin_names.push(plugin.name().to_string());
        self.dispatcher = self.dispatcher.subscriber(plugin);
        self
    }

    pub fn plugins(self, plugins: impl IntoIterator<Item = CommandPlugin>) -> Self {
        plugins.into_iter().fold(self, Self::plugin)
    }

    /// Register an extra subscriber that owns no config section.
    pub fn subscriber(mut self, subscriber: impl Subscriber + 'static) -> Self {
        self.dispatcher = self.dispatcher.subscriber(subscriber);
        self
    }

    pub fn build(self) -> PhpGuard {
        PhpGuard {
            dispatcher: self.dispatcher.build(),
            compiler: self.compiler,
            context: self.context,
            plugin_names: self.plugin_names,
            options: GuardOptions::default(),
            config: None,
            config_file: None,
        }
    }
}

pub struct PhpGuard {
    dispatcher: Dispatcher,
    compiler: Box<dyn ConfigCompiler>,
    context: Context,
    plugin_names: Vec<String>,
    options: GuardOptions,
    config: Option<Arc<CompiledConfig>>,
    config_file: Option<PathBuf>,
}

impl fmt::Debug for PhpGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhpGuard")
            .field("plugins", &self.plugin_names)
            .field("options", &self.options)
            .field("config_file", &self.config_file)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl PhpGuard {
    pub fn builder(context: Context) -> PhpGuardBuilder {
        PhpGuardBuilder::new(context)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn options(&self) -> &GuardOptions {
        &self.options
    }

    pub fn plugin_names(&self) -> &[String] {
        &self.plugin_names
    }

    pub fn config(&self) -> Option<&CompiledConfig> {
        self.config.as_deref()
    }

    /// The file the current config came from.
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Load `phpguard.yml` (or `.dist`) from the working directory.
    ///
    /// A second call is a no-op unless `reload` is set. Any failure here is a
    /// configuration error.
    pub fn load_configuration(&mut self, reload: bool) -> Result<()> {
        if self.is_configured() && !reload {
            debug!("configuration already loaded");
            return Ok(());
        }

        let file = resolve_config_path(&self.context.cwd)?;
        info!("loading configuration from {}", file.display());

        let mut event = Event::Config(ConfigEvent {
            file: file.clone(),
            config: None,
        });
        self.dispatcher
            .dispatch(Hook::PreLoadConfig, &mut event, &mut self.context)?;

        let compiled = self.compiler.compile_file(&file)?;
        let known: Vec<&str> = self.plugin_names.iter().map(String::as_str).collect();
        validate_config(&compiled, &known, &self.context.linters)?;

        let options = GuardOptions {
            ignores: compiled.phpguard.ignores.clone(),
            latency: compiled.phpguard.latency,
        };
        let compiled = Arc::new(compiled);

        let mut event = Event::Config(ConfigEvent {
            file: file.clone(),
            config: Some(Arc::clone(&compiled)),
        });
        self.dispatcher
            .dispatch(Hook::PostLoadConfig, &mut event, &mut self.context)?;

        self.options = options;
        self.config = Some(compiled);
        self.config_file = Some(file);
        Ok(())
    }

    /// One evaluation cycle over `changeset`.
    ///
    /// An empty change set fires nothing. Otherwise `preEvaluate` and then
    /// exactly one `postEvaluate` are dispatched on the same event, and the
    /// results the plugins appended are returned.
    pub fn listen(&mut self, changeset: ChangeSet) -> Result<Vec<EvalResult>> {
        if changeset.is_empty() {
            return Ok(Vec::new());
        }
        debug!(files = changeset.len(), "evaluating change set");

        let mut event = Event::Evaluate(EvaluateEvent::new(changeset));
        self.dispatcher
            .dispatch(Hook::PreEvaluate, &mut event, &mut self.context)?;
        self.dispatcher
            .dispatch(Hook::PostEvaluate, &mut event, &mut self.context)?;

        Ok(event.results().to_vec())
    }

    /// Ask every active plugin to run its full suite.
    pub fn run_all(&mut self) -> Result<Vec<EvalResult>> {
        info!("running all tests");
        let mut event = Event::RunAll(RunAllEvent::default());
        self.dispatcher
            .dispatch(Hook::PreRunAll, &mut event, &mut self.context)?;
        self.dispatcher
            .dispatch(Hook::PostRunAll, &mut event, &mut self.context)?;
        Ok(event.results().to_vec())
    }

    /// True when a loaded plugin section sets `options.all_on_start`.
    pub fn wants_run_all_on_start(&self) -> bool {
        self.config
            .as_deref()
            .is_some_and(|c| c.plugins.values().any(|s| s.options.all_on_start))
    }
}
