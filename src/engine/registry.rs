// src/engine/registry.rs

//! The ordered engine set and its construction from settings.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use globset::GlobSet;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{Engine, EngineKind, LintEngine, Priority, SuffixRule, SuffixTransformEngine, TemplateEngine};
use crate::aggregate::{ConfigEngine, DependencyMap};
use crate::exec::TemplateRunner;
use crate::fs::{FileSystem, relative_str};
use crate::settings::Settings;
use crate::transform::{CssLinter, CssMinifier, JsLinter, JsMinifier, StyleCompiler};
use crate::types::JsMode;

/// Names accepted in `[pipeline].engine_order`.
pub const ENGINE_NAMES: &[&str] = &[
    "lint-js",
    "lint-css",
    "config",
    "style",
    "css",
    "js",
    "js-simple",
    "js-whitespace",
    "template",
];

/// Collaborators shared by every engine set built during the process
/// lifetime. Survives settings reloads.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub fs: Arc<dyn FileSystem>,
    pub deps: Arc<DependencyMap>,
    pub template_runner: Arc<dyn TemplateRunner>,
    pub root: PathBuf,
}

/// An engine together with its claim on a particular file.
#[derive(Debug, Clone)]
pub struct RankedEngine {
    pub engine: Arc<dyn Engine>,
    pub priority: Priority,
}

/// Engines in registration order.
///
/// Registration order breaks priority ties: the earlier engine wins.
#[derive(Debug, Clone, Default)]
pub struct EngineSet {
    engines: Vec<Arc<dyn Engine>>,
    config_suffix: Option<String>,
    ignore: GlobSet,
    root: PathBuf,
    detail_log: bool,
}

impl EngineSet {
    pub fn builder() -> EngineSetBuilder {
        EngineSetBuilder::default()
    }

    /// Build the engines named in `[pipeline].engine_order`, in that order.
    pub fn from_settings(settings: &Settings, ctx: &EngineContext) -> Self {
        let mut builder = EngineSet::builder()
            .config_suffix(&settings.aggregate.suffix)
            .ignore(settings.ignore_set().clone())
            .root(&ctx.root)
            .detail_log(settings.pipeline.show_detail_log);

        for name in settings.pipeline.engine_order.iter() {
            match build_engine(name, settings, ctx) {
                Some(engine) => builder = builder.engine(engine),
                None => debug!(engine = %name, "engine disabled by settings"),
            }
        }

        let set = builder.build();
        info!(engines = ?set.names(), "engine set built");
        set
    }

    pub fn engines(&self) -> &[Arc<dyn Engine>] {
        &self.engines
    }

    pub fn names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Engines claiming `path`, by descending priority. Ties keep
    /// registration order.
    pub fn ranked(&self, path: &Path) -> Vec<RankedEngine> {
        let mut ranked: Vec<RankedEngine> = self
            .engines
            .iter()
            .filter_map(|engine| {
                let priority = engine.classify(path);
                (priority > 0).then(|| RankedEngine {
                    engine: Arc::clone(engine),
                    priority,
                })
            })
            .collect();
        // Stable sort.
        ranked.sort_by(|a, b| b.priority.cmp(&a.priority));
        ranked
    }

    pub fn is_handled(&self, path: &Path) -> bool {
        self.engines.iter().any(|e| e.classify(path) > 0)
    }

    /// Does a transform engine (aggregation included) claim `path`?
    pub fn is_transformed(&self, path: &Path) -> bool {
        self.engines
            .iter()
            .any(|e| e.kind() == EngineKind::Transform && e.classify(path) > 0)
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.ignore.is_empty() {
            return false;
        }
        match relative_str(&self.root, path) {
            Some(rel) => self.ignore.is_match(&rel),
            None => self.ignore.is_match(path),
        }
    }

    /// Derived files the transform engines would write for `path`.
    pub fn outputs_for(&self, path: &Path) -> Vec<PathBuf> {
        self.engines
            .iter()
            .filter(|e| e.kind() == EngineKind::Transform)
            .flat_map(|e| e.outputs_for(path))
            .collect()
    }

    pub fn config_suffix(&self) -> Option<&str> {
        self.config_suffix.as_deref()
    }

    pub fn is_config(&self, path: &Path) -> bool {
        match (self.config_suffix.as_deref(), path.file_name().and_then(|n| n.to_str())) {
            (Some(suffix), Some(name)) => name.to_lowercase().ends_with(&suffix.to_lowercase()),
            _ => false,
        }
    }

    pub fn detail_log(&self) -> bool {
        self.detail_log
    }

    /// Dispose every engine and collect the work they left running.
    pub fn dispose(&self) -> Vec<JoinHandle<()>> {
        let tasks: Vec<JoinHandle<()>> =
            self.engines.iter().flat_map(|engine| engine.dispose()).collect();
        debug!(count = self.engines.len(), tasks = tasks.len(), "engine set disposed");
        tasks
    }
}

#[derive(Debug, Default)]
pub struct EngineSetBuilder {
    set: EngineSet,
}

impl EngineSetBuilder {
    pub fn engine(mut self, engine: Arc<dyn Engine>) -> Self {
        self.set.engines.push(engine);
        self
    }

    pub fn config_suffix(mut self, suffix: &str) -> Self {
        self.set.config_suffix = Some(suffix.to_string());
        self
    }

    pub fn ignore(mut self, ignore: GlobSet) -> Self {
        self.set.ignore = ignore;
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.set.root = root.into();
        self
    }

    pub fn detail_log(mut self, on: bool) -> Self {
        self.set.detail_log = on;
        self
    }

    pub fn build(self) -> EngineSet {
        self.set
    }
}

fn minifier_engine(
    name: &str,
    suffixes: &[String],
    output: &str,
    mode: JsMode,
    fs: &Arc<dyn FileSystem>,
) -> Arc<dyn Engine> {
    Arc::new(SuffixTransformEngine::new(
        name,
        SuffixRule::new(suffixes.iter().cloned(), Some(output)),
        Arc::new(JsMinifier::new(mode)),
        Arc::clone(fs),
    ))
}

fn build_engine(name: &str, s: &Settings, ctx: &EngineContext) -> Option<Arc<dyn Engine>> {
    let fs = &ctx.fs;
    let engine: Arc<dyn Engine> = match name {
        "config" => Arc::new(
            ConfigEngine::new(&s.aggregate.suffix, Arc::clone(fs), Arc::clone(&ctx.deps))
                .with_style_sources(s.style.source_extensions.clone())
                .with_js_minifier(Arc::new(JsMinifier::new(s.js.aggregate_mode))),
        ),
        "style" => Arc::new(SuffixTransformEngine::new(
            "style",
            SuffixRule::new(s.style.suffixes.iter().cloned(), Some(s.style.output.as_str())),
            Arc::new(StyleCompiler),
            Arc::clone(fs),
        )),
        "css" => Arc::new(SuffixTransformEngine::new(
            "css",
            SuffixRule::new(s.css.suffixes.iter().cloned(), Some(s.css.output.as_str())),
            Arc::new(CssMinifier),
            Arc::clone(fs),
        )),
        "js" => minifier_engine("js", &s.js.suffixes, &s.js.output, JsMode::Full, fs),
        "js-simple" => minifier_engine(
            "js-simple",
            &s.js.simple_suffixes,
            &s.js.output,
            JsMode::Simple,
            fs,
        ),
        "js-whitespace" => minifier_engine(
            "js-whitespace",
            &s.js.whitespace_suffixes,
            &s.js.output,
            JsMode::Whitespace,
            fs,
        ),
        "lint-js" if s.lint.enabled => Arc::new(LintEngine::new(
            "lint-js",
            SuffixRule::new(s.lint.js_suffixes.iter().cloned(), None)
                .excluding([s.js.output.clone()]),
            s.lint.priority,
            Arc::new(JsLinter),
            Arc::clone(fs),
        )),
        "lint-css" if s.lint.enabled => Arc::new(LintEngine::new(
            "lint-css",
            SuffixRule::new(s.lint.css_suffixes.iter().cloned(), None)
                .excluding([s.css.output.clone()]),
            s.lint.priority,
            Arc::new(CssLinter),
            Arc::clone(fs),
        )),
        "template" if s.template.enabled => Arc::new(TemplateEngine::new(
            s.template_triggers().clone(),
            &ctx.root,
            &s.template.command,
            Duration::from_millis(s.template.debounce_ms),
            Arc::clone(&ctx.template_runner),
        )),
        _ => return None,
    };
    Some(engine)
}
