// src/plugin/command.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::model::{PluginOptions, PluginSection};
use crate::coverage::LineSet;
use crate::engine::context::{Context, InputOptions};
use crate::engine::dispatcher::Subscriber;
use crate::engine::events::{Event, Hook};
use crate::engine::result::EvalResult;
use crate::errors::Result;
use crate::exec::{CommandLine, CommandRunner, ProcessRunner};
use crate::types::ChangeSet;
use crate::watch::rule::{MatchedFile, WatchRule};

/// A plugin that runs an external test command on matched files.
///
/// It stays inactive until a config section with its name is loaded.
pub struct CommandPlugin {
    name: String,
    title: String,
    default_command: String,
    runner: Box<dyn CommandRunner>,
    options: PluginOptions,
    rules: Vec<WatchRule>,
    active: bool,
}

impl fmt::Debug for CommandPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandPlugin")
            .field("name", &self.name)
            .field("active", &self.active)
            .field("rules", &self.rules.len())
            .finish_non_exhaustive()
    }
}

impl CommandPlugin {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        default_command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            default_command: default_command.into(),
            runner: Box::new(ProcessRunner),
            options: PluginOptions::default(),
            rules: Vec::new(),
            active: false,
        }
    }

    pub fn phpunit() -> Self {
        Self::new("phpunit", "PhpUnit", "vendor/bin/phpunit")
    }

    pub fn phpspec() -> Self {
        Self::new("phpspec", "PhpSpec", "vendor/bin/phpspec run")
    }

    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    /// Apply (or clear) this plugin's config section.
    ///
    /// Rules are compiled relative to `base_dir`. Reloading replaces the
    /// previous rules entirely.
    pub fn configure(&mut self, section: Option<&PluginSection>, base_dir: &Path) -> Result<()> {
        let Some(section) = section else {
            self.active = false;
            self.rules.clear();
            self.options = PluginOptions::default();
            debug!(plugin = %self.name, "no config section; plugin inactive");
            return Ok(());
        };

        self.rules = section
            .watch
            .iter()
            .map(|spec| WatchRule::from_spec(spec, base_dir))
            .collect::<Result<_>>()?;
        self.options = section.options.clone();
        self.active = true;

        debug!(plugin = %self.name, rules = self.rules.len(), "plugin configured");
        Ok(())
    }

    fn selected<'a>(&'a self, input: &'a InputOptions) -> impl Iterator<Item = &'a WatchRule> {
        self.rules.iter().filter(move |rule| {
            rule.has_tags(&input.tags)
                && input.group.as_deref().is_none_or(|g| rule.has_group(g))
        })
    }

    fn command_line(&self, extra: Option<&str>) -> String {
        let base = self.options.command.as_deref().unwrap_or(&self.default_command);
        match extra.map(str::trim).filter(|s| !s.is_empty()) {
            Some(extra) => format!("{base} {extra}"),
            None => base.to_string(),
        }
    }

    /// Match the change set against the selected rules, lint the changed
    /// files, and run the command once over the surviving targets.
    pub fn evaluate(&mut self, changeset: &ChangeSet, ctx: &mut Context) -> Result<Vec<EvalResult>> {
        let mut results = Vec::new();
        let mut targets: BTreeSet<MatchedFile> = BTreeSet::new();

        for file in changeset.files() {
            // Each linter sees a file at most once, and a file fails at most once.
            let mut verdicts: BTreeMap<&str, bool> = BTreeMap::new();
            let mut lint_failed = false;

            for rule in self.selected(&ctx.input) {
                let Some(matched) = rule.match_file(file) else {
                    continue;
                };
                let passed = match rule.lint_id() {
                    None => true,
                    Some(id) => match verdicts.get(id) {
                        Some(verdict) => *verdict,
                        None => {
                            let verdict = rule.lint(file, &ctx.linters)?;
                            verdicts.insert(id, verdict);
                            verdict
                        }
                    },
                };
                if !passed {
                    if !lint_failed {
                        warn!(plugin = %self.name, ?file, "lint failed; skipping");
                        results.push(EvalResult::failed(format!("{}: lint", self.title)).with_arguments([
                            ("plugin", json!(self.name)),
                            ("file", json!(file.to_string_lossy())),
                        ]));
                        lint_failed = true;
                    }
                    continue;
                }
                targets.insert(matched);
            }
        }

        if targets.is_empty() {
            debug!(plugin = %self.name, "no matching files");
            return Ok(results);
        }

        let files: Vec<String> = targets
            .iter()
            .map(|m| m.relative_path_name().to_string())
            .collect();
        let cmd = CommandLine::new(self.command_line(self.options.cli.as_deref()))
            .with_files(files.clone());
        results.push(self.execute(&cmd, ctx, files));
        Ok(results)
    }

    /// Run the full suite, ignoring rules.
    pub fn run_all(&mut self, ctx: &mut Context) -> Result<Vec<EvalResult>> {
        let extra = self
            .options
            .run_all_cli
            .as_deref()
            .or(self.options.cli.as_deref());
        let cmd = CommandLine::new(self.command_line(extra));
        Ok(vec![self.execute(&cmd, ctx, Vec::new())])
    }

    fn execute(&mut self, cmd: &CommandLine, ctx: &mut Context, files: Vec<String>) -> EvalResult {
        info!("{}: running {}", self.title, cmd);

        ctx.coverage.start(&self.name, false);
        let outcome = self.runner.run(cmd, &ctx.cwd);
        ctx.coverage.stop(true, &LineSet::new(), &LineSet::new());

        let arguments = [
            ("plugin", json!(self.name)),
            ("command", json!(cmd.to_string())),
            ("files", json!(files)),
        ];
        match outcome {
            Ok(0) => {
                info!("{}: tests passed", self.title);
                EvalResult::succeeded(&self.title).with_arguments(arguments)
            }
            Ok(code) => {
                warn!("{}: tests failed (exit code {code})", self.title);
                EvalResult::failed(&self.title)
                    .with_arguments(arguments)
                    .with_arguments([("exit_code", json!(code))])
            }
            Err(err) => {
                warn!(error = %err, "{}: could not run {}", self.title, cmd);
                EvalResult::broken(&self.title, err).with_arguments(arguments)
            }
        }
    }
}

impl Subscriber for CommandPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn subscriptions(&self) -> Vec<(Hook, i32)> {
        vec![
            (Hook::PostLoadConfig, 0),
            (Hook::PostEvaluate, 0),
            (Hook::PostRunAll, 0),
        ]
    }

    fn handle(&mut self, hook: Hook, event: &mut Event, ctx: &mut Context) -> Result<()> {
        match hook {
            Hook::PostLoadConfig => {
                let section = event.config().and_then(|c| c.plugin(&self.name));
                self.configure(section, &ctx.cwd)
            }
            Hook::PostEvaluate if self.active => {
                let Some(changeset) = event.changeset().cloned() else {
                    return Ok(());
                };
                for result in self.evaluate(&changeset, ctx)? {
                    event.push_result(result);
                }
                Ok(())
            }
            Hook::PostRunAll if self.active => {
                for result in self.run_all(ctx)? {
                    event.push_result(result);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
