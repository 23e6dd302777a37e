// src/events.rs

//! Inbound file events.
//!
//! Whatever observes the project (the filesystem watcher, an editor
//! integration, a test) reports changes through [`EditorEvents`]. The
//! pipeline knows nothing about where the events come from.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::pipeline::Pipeline;
use crate::queue::core::EnqueueOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// Added or saved.
    Changed(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
    Removed(PathBuf),
}

pub trait EditorEvents {
    fn on_file_changed(&self, path: &Path);
    fn on_file_renamed(&self, from: &Path, to: &Path);
    fn on_file_removed(&self, path: &Path);

    fn dispatch(&self, event: FileEvent) {
        match event {
            FileEvent::Changed(path) => self.on_file_changed(&path),
            FileEvent::Renamed { from, to } => self.on_file_renamed(&from, &to),
            FileEvent::Removed(path) => self.on_file_removed(&path),
        }
    }
}

impl EditorEvents for Pipeline {
    fn on_file_changed(&self, path: &Path) {
        file_changed(self, path);
    }

    fn on_file_renamed(&self, from: &Path, to: &Path) {
        file_renamed(self, from, to);
    }

    fn on_file_removed(&self, path: &Path) {
        file_removed(self, path);
    }
}

/// Enqueue `path` if an engine handles it or a config depends on it.
pub fn file_changed(pipeline: &Pipeline, path: &Path) -> Option<EnqueueOutcome> {
    if pipeline.fs().is_dir(path) {
        return None;
    }
    if !pipeline.is_handled(path) && !pipeline.dependencies().has_dependents(path) {
        debug!(file = %path.display(), "change not relevant to any engine");
        return None;
    }
    Some(pipeline.enqueue(path))
}

/// Withdraw everything the pipeline holds for a file that no longer exists
/// under this name. Returns the configs that referenced it.
fn forget(pipeline: &Pipeline, path: &Path) -> Vec<PathBuf> {
    pipeline.remove(path);
    pipeline.diagnostics().clear(path);
    if pipeline.is_transformed(path) {
        pipeline.delete_outputs(path);
    }
    let deps = pipeline.dependencies();
    let dependents = deps.dependents_of(path);
    deps.remove_config(path);
    dependents
}

pub fn file_removed(pipeline: &Pipeline, path: &Path) {
    debug!(file = %path.display(), "file removed");
    for config in forget(pipeline, path) {
        pipeline.enqueue(&config);
    }
}

pub fn file_renamed(pipeline: &Pipeline, from: &Path, to: &Path) {
    debug!(from = %from.display(), to = %to.display(), "file renamed");
    let mut configs = pipeline.dependencies().dependents_of(to);
    for config in forget(pipeline, from) {
        if !configs.contains(&config) {
            configs.push(config);
        }
    }

    if pipeline.is_handled(to) {
        pipeline.enqueue(to);
    }
    for config in configs {
        pipeline.enqueue(&config);
    }
}
