// src/aggregate/engine.rs

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use super::deps::DependencyMap;
use super::model::{ConfigDocument, ConfigGroup, MemberFile, parse_config, resolve_member};
use crate::engine::{Engine, EngineKind, ErrorResult, Priority, SuffixRule, TransformResult};
use crate::fs::FileSystem;
use crate::transform::{CssMinifier, JsMinifier, StyleCompiler, TextTransform};
use crate::types::Severity;

const CSS_EXTENSION: &str = ".css";
const JS_EXTENSION: &str = ".js";

/// Transform engine for aggregation config files.
#[derive(Debug)]
pub struct ConfigEngine {
    rule: SuffixRule,
    style_sources: Vec<String>,
    style_compiler: Arc<dyn TextTransform>,
    css_minifier: Arc<dyn TextTransform>,
    js_minifier: Arc<dyn TextTransform>,
    fs: Arc<dyn FileSystem>,
    deps: Arc<DependencyMap>,
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_lowercase().ends_with(&ext.to_lowercase()))
        .unwrap_or(false)
}

impl ConfigEngine {
    pub fn new(suffix: &str, fs: Arc<dyn FileSystem>, deps: Arc<DependencyMap>) -> Self {
        Self {
            rule: SuffixRule::new([suffix], None),
            style_sources: vec![".less".to_string()],
            style_compiler: Arc::new(StyleCompiler),
            css_minifier: Arc::new(CssMinifier),
            js_minifier: Arc::new(JsMinifier::default()),
            fs,
            deps,
        }
    }

    pub fn with_style_sources(mut self, extensions: Vec<String>) -> Self {
        self.style_sources = extensions;
        self
    }

    pub fn with_style_compiler(mut self, t: Arc<dyn TextTransform>) -> Self {
        self.style_compiler = t;
        self
    }

    pub fn with_css_minifier(mut self, t: Arc<dyn TextTransform>) -> Self {
        self.css_minifier = t;
        self
    }

    pub fn with_js_minifier(mut self, t: Arc<dyn TextTransform>) -> Self {
        self.js_minifier = t;
        self
    }

    fn is_style_source(&self, path: &Path) -> bool {
        self.style_sources.iter().any(|ext| has_extension(path, ext))
    }

    /// Load and parse `config` from storage, without building anything.
    pub fn load(fs: &dyn FileSystem, config: &Path) -> anyhow::Result<ConfigDocument> {
        let text = fs.read_to_string(config)?;
        let dir = config.parent().unwrap_or_else(|| Path::new(""));
        Ok(parse_config(&text, dir)?)
    }

    /// Run `text` through `transform`, turning every failure into a
    /// diagnostic on `member`.
    fn apply(
        &self,
        transform: &dyn TextTransform,
        member: &Path,
        text: &str,
        results: &mut Vec<TransformResult>,
    ) -> Option<String> {
        match transform.transform(member, text) {
            Ok(Ok(out)) => Some(out),
            Ok(Err(issues)) => {
                results.extend(
                    issues
                        .into_iter()
                        .map(|issue| TransformResult::from_issue(member, issue)),
                );
                None
            }
            Err(e) => {
                results.push(TransformResult::error(
                    member,
                    format!("{} failed: {e:#}", transform.name()),
                ));
                None
            }
        }
    }

    /// Content of one member after compilation and minification. Failures
    /// are pushed onto `results` and yield empty content.
    fn render_member(&self, member: &MemberFile, results: &mut Vec<TransformResult>) -> String {
        let path = member.path.as_path();
        let mut text = match self.fs.read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                results.push(TransformResult::error(path, format!("cannot read member: {e:#}")));
                return String::new();
            }
        };

        let style = self.is_style_source(path);
        if style {
            match self.apply(self.style_compiler.as_ref(), path, &text, results) {
                Some(out) => text = out,
                None => return String::new(),
            }
        }

        if member.minify {
            let minifier = if style || has_extension(path, CSS_EXTENSION) {
                Some(&self.css_minifier)
            } else if has_extension(path, JS_EXTENSION) {
                Some(&self.js_minifier)
            } else {
                None
            };
            if let Some(minifier) = minifier {
                match self.apply(&**minifier, path, &text, results) {
                    Some(out) => text = out,
                    None => return String::new(),
                }
            }
        }

        text
    }

    fn render_group(
        &self,
        config_dir: &Path,
        group: &ConfigGroup,
        results: &mut Vec<TransformResult>,
    ) -> TransformResult {
        let parts: Vec<String> = group
            .members
            .iter()
            .map(|member| self.render_member(member, results))
            .collect();
        let output = resolve_member(config_dir, &group.output_name);
        debug!(output = %output.display(), members = parts.len(), "aggregate rendered");
        TransformResult::derived(output, parts.join("\n"))
    }
}

impl Engine for ConfigEngine {
    fn name(&self) -> &str {
        "config"
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Transform
    }

    fn classify(&self, path: &Path) -> Priority {
        self.rule.priority(path)
    }

    fn run(&self, path: &Path, content: Option<&str>) -> anyhow::Result<Vec<TransformResult>> {
        let text = match content {
            Some(text) => text.to_string(),
            None => self.fs.read_to_string(path)?,
        };
        let config_dir = path.parent().unwrap_or_else(|| Path::new(""));

        let doc = match parse_config(&text, config_dir) {
            Ok(doc) => doc,
            Err(e) => {
                // Dependencies stay as they were until the config parses again.
                warn!(config = %path.display(), error = %e, "config parse failed");
                return Ok(vec![TransformResult::Error(ErrorResult {
                    source_file: path.to_path_buf(),
                    message: e.message,
                    line: e.line,
                    column: e.column,
                    severity: Severity::Error,
                })]);
            }
        };

        let mut results = Vec::new();
        for group in doc.groups.iter() {
            let mut member_results = Vec::new();
            let file = self.render_group(config_dir, group, &mut member_results);
            results.extend(member_results);
            results.push(file);
        }

        for rejected in self.deps.replace_config(path, &doc.member_paths()) {
            results.push(TransformResult::warning(
                path,
                format!(
                    "{} would make this config depend on itself; it is not tracked for rebuilds",
                    rejected.display()
                ),
            ));
        }

        Ok(results)
    }
}
