// src/lib.rs

pub mod cli;
pub mod config;
pub mod coverage;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod lint;
pub mod logging;
pub mod plugin;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::coverage::CoverageSession;
use crate::coverage::cache::CACHE_DIR_NAME;
use crate::engine::{Context, CycleSummary, PhpGuard, Runtime, RuntimeEvent};
use crate::plugin::default_plugins;
use crate::watch::{IgnoreSet, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the coverage session (seeded from the cache when one exists)
/// - config loading and the plugin set
/// - the file watcher and runtime loop (skipped with `--once`)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cwd = project_dir(args.cwd.as_deref())?;
    let cache_dir = cwd.join(CACHE_DIR_NAME);

    let session = match CoverageSession::load_cached(&cache_dir)? {
        Some(session) => {
            debug!(?cache_dir, "seeded coverage session from cache");
            session
        }
        None => CoverageSession::new(&cache_dir),
    };

    let context = Context::new(&cwd, session).with_input(args.input_options());
    let mut guard = PhpGuard::builder(context)
        .plugins(default_plugins())
        .build();
    guard.load_configuration(false)?;

    if args.dry_run {
        print_dry_run(&guard);
        return Ok(());
    }

    if args.once {
        let results = tokio::task::block_in_place(|| guard.run_all())?;
        let summary = CycleSummary::of(&results);
        info!(?summary, "run finished");
        if !summary.is_green() {
            bail!("test run failed");
        }
        return Ok(());
    }

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // The cache directory is written every cycle; watching it would loop.
    let mut ignores = guard.options().ignores.clone();
    ignores.push(CACHE_DIR_NAME.to_string());
    let _watcher_handle = spawn_watcher(
        &cwd,
        IgnoreSet::new(&ignores)?,
        guard.options().latency_duration(),
        rt_tx.clone(),
    )?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    if args.all || guard.wants_run_all_on_start() {
        rt_tx.send(RuntimeEvent::RunAllRequested).await?;
    }

    info!("watching {}", cwd.display());
    Runtime::new(guard, rt_rx).run().await?;
    Ok(())
}

/// `--cwd`, else the process working directory, canonicalized when possible.
fn project_dir(arg: Option<&Path>) -> Result<PathBuf> {
    let dir = match arg {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Ok(dir.canonicalize().unwrap_or(dir))
}

/// Print the loaded configuration: options, then each plugin's rules.
fn print_dry_run(guard: &PhpGuard) {
    println!("phpguard dry-run");
    if let Some(file) = guard.config_file() {
        println!("  config = {}", file.display());
    }
    let options = guard.options();
    println!("  latency = {}us", options.latency);
    if !options.ignores.is_empty() {
        println!("  ignores = {:?}", options.ignores);
    }
    let coverage = guard.context().coverage.options();
    println!(
        "  coverage = {}",
        if guard.context().coverage.is_enabled() { "enabled" } else { "disabled" }
    );
    if let Some(html) = &coverage.output_html {
        println!("      html: {}", html.display());
    }
    if let Some(clover) = &coverage.output_clover {
        println!("      clover: {}", clover.display());
    }
    println!();

    let Some(config) = guard.config() else {
        return;
    };
    println!("plugins ({}):", config.plugins.len());
    for (name, section) in config.plugins.iter() {
        println!("  - {name}");
        if let Some(cmd) = &section.options.command {
            println!("      command: {cmd}");
        }
        if let Some(cli) = &section.options.cli {
            println!("      cli: {cli}");
        }
        for spec in &section.watch {
            println!("      watch: {}", spec.pattern.as_deref().unwrap_or_default());
            if let Some(transform) = &spec.transform {
                println!("        transform: {transform}");
            }
            if !spec.tags.is_empty() {
                println!("        tags: {:?}", spec.tags);
            }
            if !spec.groups.is_empty() {
                println!("        groups: {:?}", spec.groups);
            }
            if let Some(lint) = &spec.lint {
                println!("        lint: {lint}");
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
