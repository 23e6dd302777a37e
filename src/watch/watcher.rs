// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use super::classify::classify_event;
use crate::events::{EditorEvents, FileEvent};
use crate::fs::PathKey;
use crate::queue::PipelineHandle;
use crate::settings::load_and_validate;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and feed changes into the pipeline.
///
/// Changes to `settings_path` reload the settings; an invalid file is
/// logged and the current engine set stays active.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    settings_path: impl Into<PathBuf>,
    handle: PipelineHandle,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());
    let settings_path = settings_path.into();
    let settings_key = PathKey::new(
        settings_path
            .canonicalize()
            .unwrap_or_else(|_| settings_path.clone()),
    );

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // No tracing subscriber guarantee on the notify thread.
                    eprintln!("cascade: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("cascade: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");

            for file_event in classify_event(&event, |p| p.exists()) {
                let touches_settings = match &file_event {
                    FileEvent::Changed(p) => PathKey::new(p) == settings_key,
                    FileEvent::Renamed { to, .. } => PathKey::new(to) == settings_key,
                    FileEvent::Removed(_) => false,
                };

                if touches_settings {
                    match load_and_validate(&settings_path) {
                        Ok(settings) => {
                            info!(path = %settings_path.display(), "settings changed; reloading engines");
                            if let Err(e) = handle.reload(&settings).await {
                                warn!(error = %e, "cannot hand new engine set to worker");
                            }
                        }
                        Err(e) => warn!(error = %e, "settings reload failed; keeping current engines"),
                    }
                    continue;
                }

                handle.dispatch(file_event);
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
