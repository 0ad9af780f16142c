// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::types::ChangeSet;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::IgnoreSet;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping it stops
/// watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and send one [`ChangeSet`] per debounce window,
/// wrapped in [`RuntimeEvent::FilesChanged`].
///
/// The first event after a quiet period opens a window of `latency`; every
/// path seen before the window closes lands in the same change set. Paths
/// matching `ignores` are dropped. Change sets queue in `events_tx` while
/// the receiver is busy, so cycles never interleave.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    ignores: IgnoreSet,
    latency: Duration,
    events_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("phpguard: failed to forward notify event: {err}");
                }
            }
            Err(err) => eprintln!("phpguard: file watch error: {err}"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(?root, ?latency, "file watcher started");

    tokio::spawn(async move {
        while let Some(first) = event_rx.recv().await {
            let mut paths: Vec<PathBuf> = Vec::new();
            collect_paths(&root, &ignores, first, &mut paths);

            let deadline = Instant::now() + latency;
            while let Ok(Some(event)) = timeout_at(deadline, event_rx.recv()).await {
                collect_paths(&root, &ignores, event, &mut paths);
            }

            let changes = ChangeSet::new(paths);
            if changes.is_empty() {
                continue;
            }

            debug!(files = changes.len(), "debounced change set ready");
            if events_tx.send(RuntimeEvent::FilesChanged(changes)).await.is_err() {
                warn!("runtime receiver dropped; stopping watcher loop");
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

fn collect_paths(root: &Path, ignores: &IgnoreSet, event: Event, out: &mut Vec<PathBuf>) {
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }
    for path in event.paths {
        let Some(rel) = relative_str(root, &path) else {
            continue;
        };
        if ignores.is_ignored(&rel) {
            debug!(path = %rel, "ignored change");
            continue;
        }
        if !out.contains(&path) {
            out.push(path);
        }
    }
}
