#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use cascade::aggregate::DependencyMap;
use cascade::diagnostics::DiagnosticsSink;
use cascade::engine::{EngineContext, EngineSet};
use cascade::fs::mock::MockFileSystem;
use cascade::pipeline::Pipeline;
use cascade::queue::{Worker, WorkerOptions, WorkerSummary};
use cascade::settings::{RawSettings, Settings};

use crate::fakes::FakeTemplateRunner;

/// Builder for `Settings` to simplify test setup. Starts from the defaults.
pub struct SettingsBuilder {
    raw: RawSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawSettings::default(),
        }
    }

    pub fn engine_order(mut self, names: &[&str]) -> Self {
        self.raw.pipeline.engine_order = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.raw.pipeline.ignore.push(pattern.to_string());
        self
    }

    pub fn lint(mut self, enabled: bool) -> Self {
        self.raw.lint.enabled = enabled;
        self
    }

    pub fn template(mut self, command: &str, triggers: &[&str], debounce_ms: u64) -> Self {
        self.raw.template.enabled = true;
        self.raw.template.command = command.to_string();
        self.raw.template.triggers = triggers.iter().map(|s| s.to_string()).collect();
        self.raw.template.debounce_ms = debounce_ms;
        self
    }

    pub fn raw(self) -> RawSettings {
        self.raw
    }

    pub fn build(self) -> Settings {
        Settings::try_from(self.raw).expect("Failed to build valid settings from builder")
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A pipeline over an in-memory filesystem.
pub struct PipelineFixture {
    pub fs: MockFileSystem,
    pub root: PathBuf,
    pub runner: FakeTemplateRunner,
    pub pipeline: Arc<Pipeline>,
}

impl PipelineFixture {
    /// Pipeline with engines built from `settings`.
    pub fn from_settings(fs: MockFileSystem, root: impl AsRef<Path>, settings: &Settings) -> Self {
        let runner = FakeTemplateRunner::default();
        let ctx = context(&fs, root.as_ref(), &runner);
        let engines = EngineSet::from_settings(settings, &ctx);
        Self::assemble(fs, root.as_ref(), runner, ctx, engines)
    }

    /// Pipeline with a hand-built engine set. `engines` receives the context
    /// so engines can share the pipeline's filesystem and dependency map.
    pub fn with_engines(
        fs: MockFileSystem,
        root: impl AsRef<Path>,
        engines: impl FnOnce(&EngineContext) -> EngineSet,
    ) -> Self {
        let runner = FakeTemplateRunner::default();
        let ctx = context(&fs, root.as_ref(), &runner);
        let engines = engines(&ctx);
        Self::assemble(fs, root.as_ref(), runner, ctx, engines)
    }

    fn assemble(
        fs: MockFileSystem,
        root: &Path,
        runner: FakeTemplateRunner,
        ctx: EngineContext,
        engines: EngineSet,
    ) -> Self {
        let pipeline = Arc::new(Pipeline::new(engines, ctx, Arc::new(DiagnosticsSink::new())));
        Self {
            fs,
            root: root.to_path_buf(),
            runner,
            pipeline,
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Run a worker until the queue is empty, cascading to dependents.
    pub async fn drain(&self) -> WorkerSummary {
        let (_control_tx, control_rx) = mpsc::channel(8);
        Worker::new(
            Arc::clone(&self.pipeline),
            control_rx,
            WorkerOptions {
                exit_when_idle: true,
            },
        )
        .run()
        .await
        .expect("worker failed")
    }
}

pub fn context(fs: &MockFileSystem, root: &Path, runner: &FakeTemplateRunner) -> EngineContext {
    EngineContext {
        fs: Arc::new(fs.clone()),
        deps: Arc::new(DependencyMap::new()),
        template_runner: Arc::new(runner.clone()),
        root: root.to_path_buf(),
    }
}
