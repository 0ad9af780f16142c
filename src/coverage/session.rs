// src/coverage/session.rs

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::model::CompiledConfig;
use crate::coverage::accumulator::{
    Accumulator, CoverageDriver, LineSet, NullDriver, RawCoverage, restrict,
};
use crate::coverage::cache::{self, SessionRecord};
use crate::coverage::filter::CoverageFilter;
use crate::coverage::options::CoverageOptions;
use crate::coverage::report;
use crate::engine::context::{Console, Context};
use crate::engine::dispatcher::Subscriber;
use crate::engine::events::{Event, Hook};
use crate::engine::result::EvalResult;
use crate::errors::{PhpGuardError, Result};
use crate::watch::path_utils::absolutize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disabled,
    Idle,
    Recording,
    Reporting,
}

/// Coverage accumulated across evaluation cycles and across processes.
///
/// The in-memory value lives as long as the daemon; what outlives it is the
/// cache file written by [`CoverageSession::save_state`].
pub struct CoverageSession {
    accumulator: Accumulator,
    filter: CoverageFilter,
    options: CoverageOptions,
    path: PathBuf,
    base_dir: PathBuf,
    driver: Box<dyn CoverageDriver>,
    current: Option<String>,
    pending: Vec<RecordedRun>,
    reporting: bool,
}

/// One `stop` since the last checkpoint, kept for replay on import.
#[derive(Debug, Clone)]
struct RecordedRun {
    id: String,
    data: RawCoverage,
    append: bool,
}

impl fmt::Debug for CoverageSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoverageSession")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("files", &self.accumulator.files().count())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CoverageSession {
    /// New, empty session persisting into `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let path = cache_dir.into();
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
        Self {
            accumulator: Accumulator::new(),
            filter: CoverageFilter::new(),
            options: CoverageOptions::default(),
            path,
            base_dir,
            driver: Box::new(NullDriver),
            current: None,
            pending: Vec::new(),
            reporting: false,
        }
    }

    pub fn with_driver(mut self, driver: impl CoverageDriver + 'static) -> Self {
        self.driver = Box::new(driver);
        self
    }

    /// Rebuild a session from its persisted record.
    pub fn from_record(record: SessionRecord) -> Self {
        let mut session = Self::new(record.path);
        session.accumulator = record.accumulator;
        session.filter = record.filter;
        session.options = record.options;
        session
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            accumulator: self.accumulator.clone(),
            filter: self.filter.clone(),
            options: self.options.clone(),
            path: self.path.clone(),
        }
    }

    /// Session stored in `<cache_dir>/coverage_session.dat`, if any.
    pub fn load_cached(cache_dir: &Path) -> Result<Option<Self>> {
        Ok(cache::load(&cache::cache_file(cache_dir))?.map(Self::from_record))
    }

    pub fn cache_file(&self) -> PathBuf {
        cache::cache_file(&self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Direct access for plugins that import coverage collected elsewhere.
    pub fn accumulator_mut(&mut self) -> &mut Accumulator {
        &mut self.accumulator
    }

    pub fn filter(&self) -> &CoverageFilter {
        &self.filter
    }

    pub fn options(&self) -> &CoverageOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: CoverageOptions) {
        self.options = options;
    }

    pub fn is_enabled(&self) -> bool {
        self.options.enabled || self.options.input_enabled
    }

    pub fn state(&self) -> SessionState {
        if !self.is_enabled() {
            SessionState::Disabled
        } else if self.reporting {
            SessionState::Reporting
        } else if self.current.is_some() {
            SessionState::Recording
        } else {
            SessionState::Idle
        }
    }

    /// Apply the `coverage` config section and the `--coverage` flag.
    ///
    /// Output paths are normalized against `cwd`; a bad output directory is
    /// a configuration error.
    pub fn configure(
        &mut self,
        cwd: &Path,
        mut options: CoverageOptions,
        input_enabled: bool,
    ) -> Result<()> {
        options.normalize(cwd)?;

        for dir in &options.whitelist {
            self.filter.add_directory_to_whitelist(absolutize(cwd, dir));
        }
        for dir in &options.blacklist {
            self.filter.add_directory_to_blacklist(absolutize(cwd, dir));
        }
        for file in &options.whitelist_files {
            self.filter.add_file_to_whitelist(absolutize(cwd, file));
        }
        for file in &options.blacklist_files {
            self.filter.add_file_to_blacklist(absolutize(cwd, file));
        }

        options.input_enabled = input_enabled;
        self.options = options;
        self.base_dir = cwd.to_path_buf();

        debug!(enabled = self.is_enabled(), "coverage configured");
        Ok(())
    }

    /// Begin attributing executed lines to `id`.
    pub fn start(&mut self, id: &str, clear: bool) {
        if !self.is_enabled() {
            return;
        }
        if let Some(previous) = &self.current {
            warn!(%previous, next = %id, "coverage start while recording; restarting");
        }
        if clear {
            self.accumulator.clear_test(id);
        }
        self.driver.start();
        self.current = Some(id.to_string());
    }

    /// Stop attributing and store what the driver measured.
    ///
    /// Non-empty line sets restrict the stored lines to their union.
    pub fn stop(&mut self, append: bool, lines_to_be_covered: &LineSet, lines_to_be_used: &LineSet) {
        if !self.is_enabled() {
            return;
        }
        let Some(id) = self.current.take() else {
            return;
        };

        let mut data = self.driver.stop();
        data.retain(|file, _| !self.filter.is_filtered(file));
        if !lines_to_be_covered.is_empty() || !lines_to_be_used.is_empty() {
            data = restrict(data, lines_to_be_covered, lines_to_be_used);
        }

        self.accumulator.append(&id, data.clone(), append);
        self.pending.push(RecordedRun { id, data, append });
    }

    /// Write the full session to the cache file, replacing what was there.
    pub fn save_state(&self) -> Result<()> {
        cache::save(&self.cache_file(), &self.to_record())
    }

    /// Write the cache and start a new cycle: runs recorded from here on
    /// are what [`CoverageSession::import_cached`] replays on top of the
    /// cache.
    pub fn checkpoint(&mut self) -> Result<()> {
        self.save_state()?;
        self.pending.clear();
        Ok(())
    }

    /// Pull in the cached session. The cached filter and accumulator replace
    /// ours, then the runs recorded since the last checkpoint are replayed.
    /// False when there is no cache.
    pub fn import_cached(&mut self) -> Result<bool> {
        let Some(record) = cache::load(&self.cache_file())? else {
            return Ok(false);
        };
        self.accumulator = record.accumulator;
        self.filter = record.filter;
        for run in self.pending.drain(..) {
            self.accumulator.append(&run.id, run.data, run.append);
        }
        Ok(true)
    }

    /// Post-cycle step: import the cache and write the configured reports.
    pub fn process(&mut self, results: &[EvalResult], console: &mut Console) -> Result<()> {
        if results.is_empty() || !self.is_enabled() {
            return Ok(());
        }
        if !self.import_cached()? {
            debug!("no coverage cache; skipping reports");
            return Ok(());
        }
        if !self.options.has_output() {
            return Ok(());
        }

        self.reporting = true;
        let outcome = self.write_reports(console);
        self.reporting = false;
        outcome
    }

    fn write_reports(&mut self, console: &mut Console) -> Result<()> {
        let filter = &self.filter;
        self.accumulator.retain_files(|f| !filter.is_filtered(f));

        if let Some(target) = self.options.output_html.clone() {
            info!("Generating html output to: {} please wait!", self.display(&target));
            report::write_html(&self.accumulator, &self.base_dir, &self.options, &target)?;
        }

        if let Some(target) = self.options.output_clover.clone() {
            info!("Generating clover output to: {} please wait!", self.display(&target));
            report::write_clover(&self.accumulator, &target)?;
        }

        if self.options.output_text {
            info!("Processing text output... please wait!");
            let text = report::render_text(
                &self.accumulator,
                &self.base_dir,
                &self.options,
                console.is_decorated(),
            );
            console
                .writeln(&text)
                .map_err(|e| PhpGuardError::ReportError(e.to_string()))?;
        }

        Ok(())
    }

    fn display(&self, target: &Path) -> String {
        target
            .strip_prefix(&self.base_dir)
            .unwrap_or(target)
            .display()
            .to_string()
    }
}

/// Hooks the coverage session into the pipeline.
///
/// Persistence runs early in `preEvaluate` / `preRunAll`; reporting runs
/// last in `postEvaluate` / `postRunAll`, after every plugin.
#[derive(Debug, Default)]
pub struct CoverageListener;

impl CoverageListener {
    pub const CONFIG_PRIORITY: i32 = -100;
    pub const PRE_EVALUATE_PRIORITY: i32 = 100;
    pub const PRE_RUN_ALL_PRIORITY: i32 = 10;
    pub const REPORT_PRIORITY: i32 = -1000;

    fn on_config_post_load(config: &CompiledConfig, ctx: &mut Context) -> Result<()> {
        let options = config.phpguard.coverage.clone().unwrap_or_default();
        let input = ctx.input.coverage;
        ctx.coverage.configure(&ctx.cwd, options, input)
    }
}

impl Subscriber for CoverageListener {
    fn name(&self) -> &str {
        "coverage"
    }

    fn subscriptions(&self) -> Vec<(Hook, i32)> {
        vec![
            (Hook::PostLoadConfig, Self::CONFIG_PRIORITY),
            (Hook::PreEvaluate, Self::PRE_EVALUATE_PRIORITY),
            (Hook::PostEvaluate, Self::REPORT_PRIORITY),
            (Hook::PreRunAll, Self::PRE_RUN_ALL_PRIORITY),
            (Hook::PostRunAll, Self::REPORT_PRIORITY),
        ]
    }

    fn handle(&mut self, hook: Hook, event: &mut Event, ctx: &mut Context) -> Result<()> {
        match hook {
            Hook::PostLoadConfig => match event.config() {
                Some(config) => Self::on_config_post_load(config, ctx),
                None => Ok(()),
            },
            Hook::PreEvaluate | Hook::PreRunAll => {
                if let Err(err) = ctx.coverage.checkpoint() {
                    warn!(error = %err, "could not persist coverage session");
                }
                Ok(())
            }
            Hook::PostEvaluate | Hook::PostRunAll => {
                // Logged only: the plugin results stay on the event.
                if let Err(err) = ctx.coverage.process(event.results(), &mut ctx.console) {
                    error!(error = %err, "coverage report failed");
                }
                Ok(())
            }
            Hook::PreLoadConfig => Ok(()),
        }
    }
}
