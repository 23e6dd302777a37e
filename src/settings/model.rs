// src/settings/model.rs

use globset::GlobSet;
use serde::Deserialize;

use crate::types::JsMode;

/// Top-level settings as read from a TOML file.
///
/// ```toml
/// [pipeline]
/// engine_order = ["lint-js", "lint-css", "config", "style", "css", "js"]
/// ignore = ["**/node_modules/**"]
///
/// [aggregate]
/// suffix = ".chirp.config"
///
/// [js]
/// suffixes = [".chirp.js"]
/// output = ".min.js"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSettings {
    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub aggregate: AggregateSection,

    #[serde(default)]
    pub style: StyleSection,

    #[serde(default)]
    pub css: CssSection,

    #[serde(default)]
    pub js: JsSection,

    #[serde(default)]
    pub lint: LintSection,

    #[serde(default)]
    pub template: TemplateSection,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Registration order of the engines. Earlier engines win priority ties;
    /// engines left out of the list are not registered.
    #[serde(default = "default_engine_order")]
    pub engine_order: Vec<String>,

    /// Glob patterns for files that are never enqueued.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Log every engine run at `info` instead of `debug`.
    #[serde(default)]
    pub show_detail_log: bool,
}

fn default_engine_order() -> Vec<String> {
    [
        "lint-js",
        "lint-css",
        "config",
        "style",
        "css",
        "js",
        "js-simple",
        "js-whitespace",
        "template",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_ignore() -> Vec<String> {
    vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/target/**".to_string(),
    ]
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            engine_order: default_engine_order(),
            ignore: default_ignore(),
            show_detail_log: false,
        }
    }
}

/// `[aggregate]` section: the config-file suffix.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateSection {
    #[serde(default = "default_aggregate_suffix")]
    pub suffix: String,
}

fn default_aggregate_suffix() -> String {
    ".chirp.config".to_string()
}

impl Default for AggregateSection {
    fn default() -> Self {
        Self {
            suffix: default_aggregate_suffix(),
        }
    }
}

/// `[style]` section: style-source compilation.
///
/// Sources are CSS with nesting; LESS variables and mixins are not compiled.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleSection {
    #[serde(default = "default_style_suffixes")]
    pub suffixes: Vec<String>,

    #[serde(default = "default_style_output")]
    pub output: String,

    /// Extensions that mark an aggregate member as a style source, which is
    /// compiled before any minification.
    #[serde(default = "default_style_sources")]
    pub source_extensions: Vec<String>,
}

fn default_style_suffixes() -> Vec<String> {
    vec![".chirp.less".to_string()]
}

fn default_style_output() -> String {
    ".css".to_string()
}

fn default_style_sources() -> Vec<String> {
    vec![".less".to_string()]
}

impl Default for StyleSection {
    fn default() -> Self {
        Self {
            suffixes: default_style_suffixes(),
            output: default_style_output(),
            source_extensions: default_style_sources(),
        }
    }
}

/// `[css]` section: stylesheet minification.
#[derive(Debug, Clone, Deserialize)]
pub struct CssSection {
    #[serde(default = "default_css_suffixes")]
    pub suffixes: Vec<String>,

    #[serde(default = "default_css_output")]
    pub output: String,
}

fn default_css_suffixes() -> Vec<String> {
    vec![".chirp.css".to_string()]
}

fn default_css_output() -> String {
    ".min.css".to_string()
}

impl Default for CssSection {
    fn default() -> Self {
        Self {
            suffixes: default_css_suffixes(),
            output: default_css_output(),
        }
    }
}

/// `[js]` section: script minification in its three modes.
#[derive(Debug, Clone, Deserialize)]
pub struct JsSection {
    #[serde(default = "default_js_suffixes")]
    pub suffixes: Vec<String>,

    #[serde(default = "default_js_simple_suffixes")]
    pub simple_suffixes: Vec<String>,

    #[serde(default = "default_js_whitespace_suffixes")]
    pub whitespace_suffixes: Vec<String>,

    #[serde(default = "default_js_output")]
    pub output: String,

    /// Mode used for script members of an aggregate that ask for `Minify`.
    #[serde(default)]
    pub aggregate_mode: JsMode,
}

fn default_js_suffixes() -> Vec<String> {
    vec![".chirp.js".to_string()]
}

fn default_js_simple_suffixes() -> Vec<String> {
    vec![".simple.js".to_string()]
}

fn default_js_whitespace_suffixes() -> Vec<String> {
    vec![".whitespace.js".to_string()]
}

fn default_js_output() -> String {
    ".min.js".to_string()
}

impl Default for JsSection {
    fn default() -> Self {
        Self {
            suffixes: default_js_suffixes(),
            simple_suffixes: default_js_simple_suffixes(),
            whitespace_suffixes: default_js_whitespace_suffixes(),
            output: default_js_output(),
            aggregate_mode: JsMode::default(),
        }
    }
}

/// `[lint]` section: syntax checking action engines.
#[derive(Debug, Clone, Deserialize)]
pub struct LintSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Priority reported by the lint engines for files they handle.
    #[serde(default = "default_lint_priority")]
    pub priority: u32,

    #[serde(default = "default_lint_js")]
    pub js_suffixes: Vec<String>,

    #[serde(default = "default_lint_css")]
    pub css_suffixes: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_lint_priority() -> u32 {
    100
}

fn default_lint_js() -> Vec<String> {
    vec![".js".to_string()]
}

fn default_lint_css() -> Vec<String> {
    vec![".css".to_string()]
}

impl Default for LintSection {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: default_lint_priority(),
            js_suffixes: default_lint_js(),
            css_suffixes: default_lint_css(),
        }
    }
}

/// `[template]` section: debounced shell command run when trigger files
/// change.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSection {
    #[serde(default)]
    pub enabled: bool,

    /// Glob patterns, relative to the project root.
    #[serde(default)]
    pub triggers: Vec<String>,

    #[serde(default)]
    pub command: String,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    1000
}

impl Default for TemplateSection {
    fn default() -> Self {
        Self {
            enabled: false,
            triggers: Vec::new(),
            command: String::new(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Validated settings.
///
/// Obtained through `Settings::try_from(RawSettings)`; glob patterns are
/// compiled once here.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pipeline: PipelineSection,
    pub aggregate: AggregateSection,
    pub style: StyleSection,
    pub css: CssSection,
    pub js: JsSection,
    pub lint: LintSection,
    pub template: TemplateSection,
    ignore: GlobSet,
    template_triggers: GlobSet,
}

impl Settings {
    pub(crate) fn new_unchecked(
        raw: RawSettings,
        ignore: GlobSet,
        template_triggers: GlobSet,
    ) -> Self {
        Self {
            pipeline: raw.pipeline,
            aggregate: raw.aggregate,
            style: raw.style,
            css: raw.css,
            js: raw.js,
            lint: raw.lint,
            template: raw.template,
            ignore,
            template_triggers,
        }
    }

    /// Compiled `[pipeline].ignore`, matched against root-relative paths.
    pub fn ignore_set(&self) -> &GlobSet {
        &self.ignore
    }

    pub fn template_triggers(&self) -> &GlobSet {
        &self.template_triggers
    }
}
