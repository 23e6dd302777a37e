// src/pipeline/mod.rs

//! Shared pipeline state.
//!
//! [`Pipeline`] owns the work queue, the current engine set, the dependency
//! map (through its [`EngineContext`]), the diagnostics sink and the index of
//! outputs written so far. Producers call [`Pipeline::enqueue`] from any
//! thread; the single worker in [`crate::queue::Worker`] drains it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::aggregate::{ConfigEngine, DependencyMap};
use crate::diagnostics::DiagnosticsSink;
use crate::engine::{EngineContext, EngineSet};
use crate::fs::{FileSystem, normalize, walk_files};
use crate::queue::core::{EnqueueOutcome, FilterReason, QueueCore};

pub mod chain;
pub mod outputs;

pub use chain::{ChainReport, run_chain};
pub use outputs::OutputIndex;

#[derive(Debug)]
pub struct Pipeline {
    queue: Mutex<QueueCore>,
    notify: Notify,
    engines: RwLock<Arc<EngineSet>>,
    context: EngineContext,
    diagnostics: Arc<DiagnosticsSink>,
    outputs: OutputIndex,
}

impl Pipeline {
    pub fn new(engines: EngineSet, context: EngineContext, diagnostics: Arc<DiagnosticsSink>) -> Self {
        Self {
            queue: Mutex::new(QueueCore::new()),
            notify: Notify::new(),
            engines: RwLock::new(Arc::new(engines)),
            context,
            diagnostics,
            outputs: OutputIndex::new(),
        }
    }

    /// Snapshot of the current engine set.
    pub fn engines(&self) -> Arc<EngineSet> {
        Arc::clone(&self.engines.read())
    }

    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.context.fs
    }

    pub fn dependencies(&self) -> &Arc<DependencyMap> {
        &self.context.deps
    }

    pub fn diagnostics(&self) -> &Arc<DiagnosticsSink> {
        &self.diagnostics
    }

    pub fn outputs(&self) -> &OutputIndex {
        &self.outputs
    }

    /// Queue `path` for processing.
    ///
    /// Ignored files and generated outputs of transformed files are turned
    /// away. The pending check and the insert happen under one lock.
    pub fn enqueue(&self, path: &Path) -> EnqueueOutcome {
        let path = normalize(path);
        let engines = self.engines();

        if engines.is_ignored(&path) {
            return EnqueueOutcome::Filtered(FilterReason::Ignored);
        }
        if let Some(source) = self.outputs.source_of(&path) {
            if engines.is_transformed(&source) {
                debug!(file = %path.display(), source = %source.display(), "generated output; not queued");
                return EnqueueOutcome::Filtered(FilterReason::DerivedOutput);
            }
        }

        let outcome = self.queue.lock().enqueue(&path);
        debug!(file = %path.display(), ?outcome, "enqueue");
        if outcome == EnqueueOutcome::Queued {
            self.notify.notify_one();
        }
        outcome
    }

    pub fn remove(&self, path: &Path) -> bool {
        self.queue.lock().remove(&normalize(path))
    }

    pub fn is_handled(&self, path: &Path) -> bool {
        self.engines().is_handled(path)
    }

    pub fn is_transformed(&self, path: &Path) -> bool {
        self.engines().is_transformed(path)
    }

    pub(crate) fn begin_next(&self) -> Option<PathBuf> {
        self.queue.lock().begin_next()
    }

    pub(crate) fn complete(&self, path: &Path) -> bool {
        let requeued = self.queue.lock().complete(path);
        if requeued {
            self.notify.notify_one();
        }
        requeued
    }

    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }

    pub fn pending(&self) -> Vec<PathBuf> {
        self.queue.lock().pending()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.lock().is_idle()
    }

    /// Run the engine chain for one file against the current engine set.
    pub fn process_file(&self, path: &Path) -> ChainReport {
        let engines = self.engines();
        run_chain(&engines, path, &self.context, &self.diagnostics, &self.outputs)
    }

    /// Swap in a new engine set. The old one is disposed, and pending files
    /// the new set ignores are dropped. Work the old engines flush keeps
    /// running in the background.
    pub fn reconfigure(&self, engines: EngineSet) {
        let new = Arc::new(engines);
        let old = {
            let mut guard = self.engines.write();
            std::mem::replace(&mut *guard, Arc::clone(&new))
        };
        let flushed = old.dispose().len();

        let dropped = self.queue.lock().retain_pending(|p| !new.is_ignored(p));
        info!(
            engines = ?new.names(),
            dropped = dropped.len(),
            flushed,
            "engine set reconfigured"
        );
    }

    /// Seed the dependency map from every config file below `root` without
    /// building anything. Returns the number of configs loaded.
    pub fn prime_dependencies(&self, root: &Path) -> Result<usize> {
        let engines = self.engines();
        if engines.config_suffix().is_none() {
            return Ok(0);
        }

        let mut loaded = 0;
        for file in walk_files(self.context.fs.as_ref(), root)? {
            if !engines.is_config(&file) || engines.is_ignored(&file) {
                continue;
            }
            match ConfigEngine::load(self.context.fs.as_ref(), &file) {
                Ok(doc) => {
                    let rejected = self.context.deps.replace_config(&file, &doc.member_paths());
                    if !rejected.is_empty() {
                        warn!(config = %file.display(), ?rejected, "members would create a cycle");
                    }
                    loaded += 1;
                }
                Err(e) => warn!(config = %file.display(), error = %e, "cannot prime dependencies"),
            }
        }
        info!(configs = loaded, members = self.context.deps.len(), "dependencies primed");
        Ok(loaded)
    }

    /// Enqueue every handled file below `root`. Returns the queued paths.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let engines = self.engines();
        let mut queued = Vec::new();
        for file in walk_files(self.context.fs.as_ref(), root)? {
            if engines.is_handled(&file) && self.enqueue(&file) == EnqueueOutcome::Queued {
                queued.push(file);
            }
        }
        info!(files = queued.len(), "scan queued files");
        Ok(queued)
    }

    /// Delete the generated outputs of `source`, as recorded or as the
    /// transform engines would name them. Returns the deleted paths.
    pub fn delete_outputs(&self, source: &Path) -> Vec<PathBuf> {
        let mut candidates = self.outputs.forget_source(source);
        for output in self.engines().outputs_for(source) {
            if !candidates.contains(&output) {
                candidates.push(output);
            }
        }

        let fs = self.context.fs.as_ref();
        let mut deleted = Vec::new();
        for output in candidates {
            if !fs.is_file(&output) {
                continue;
            }
            match fs.remove_file(&output) {
                Ok(()) => {
                    info!(output = %output.display(), "removed generated output");
                    self.diagnostics.clear(&output);
                    deleted.push(output);
                }
                Err(e) => warn!(output = %output.display(), error = %e, "cannot remove generated output"),
            }
        }
        deleted
    }
}
