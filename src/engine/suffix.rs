// src/engine/suffix.rs

//! Suffix-based file ownership and the generic transform engine built on it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};

use super::{Engine, EngineKind, Priority, TransformResult};
use crate::fs::FileSystem;
use crate::transform::TextTransform;

/// Case-insensitive filename suffix matcher.
///
/// The priority of a match is the length of the longest matching suffix, so
/// `site.chirp.css` prefers a `.chirp.css` rule over a `.css` one. A file
/// ending with the rule's own output extension is never matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixRule {
    suffixes: Vec<String>,
    output: Option<String>,
    excluded: Vec<String>,
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

impl SuffixRule {
    pub fn new<S: Into<String>>(suffixes: impl IntoIterator<Item = S>, output: Option<&str>) -> Self {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
            output: output.map(str::to_string),
            excluded: Vec::new(),
        }
    }

    /// Additional suffixes that disqualify a file, e.g. other engines'
    /// generated outputs.
    pub fn excluding<S: Into<String>>(mut self, suffixes: impl IntoIterator<Item = S>) -> Self {
        self.excluded.extend(suffixes.into_iter().map(Into::into));
        self
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Longest suffix matching `path`, if the rule applies.
    pub fn matched(&self, path: &Path) -> Option<&str> {
        let name = file_name(path)?;
        if let Some(output) = self.output.as_deref() {
            if ends_with_ignore_case(name, output) {
                return None;
            }
        }
        if self.excluded.iter().any(|s| ends_with_ignore_case(name, s)) {
            return None;
        }
        self.suffixes
            .iter()
            .filter(|s| ends_with_ignore_case(name, s))
            .max_by_key(|s| s.len())
            .map(String::as_str)
    }

    pub fn priority(&self, path: &Path) -> Priority {
        self.matched(path).map(|s| s.len() as Priority).unwrap_or(0)
    }

    /// `path` with the matched suffix replaced by the output extension.
    pub fn output_path(&self, path: &Path) -> Option<PathBuf> {
        let output = self.output.as_deref()?;
        let suffix = self.matched(path)?;
        let name = file_name(path)?;
        let stem = &name[..name.len() - suffix.len()];
        Some(path.with_file_name(format!("{stem}{output}")))
    }
}

/// Transform engine: one input file, one derived output next to it.
#[derive(Debug)]
pub struct SuffixTransformEngine {
    name: String,
    rule: SuffixRule,
    transform: Arc<dyn TextTransform>,
    fs: Arc<dyn FileSystem>,
}

impl SuffixTransformEngine {
    pub fn new(
        name: impl Into<String>,
        rule: SuffixRule,
        transform: Arc<dyn TextTransform>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            name: name.into(),
            rule,
            transform,
            fs,
        }
    }

    pub fn rule(&self) -> &SuffixRule {
        &self.rule
    }
}

impl Engine for SuffixTransformEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Transform
    }

    fn classify(&self, path: &Path) -> Priority {
        self.rule.priority(path)
    }

    fn run(&self, path: &Path, content: Option<&str>) -> anyhow::Result<Vec<TransformResult>> {
        let output = self
            .rule
            .output_path(path)
            .ok_or_else(|| anyhow!("engine '{}' does not handle {:?}", self.name, path))?;

        let source = match content {
            Some(text) => text.to_string(),
            None => self.fs.read_to_string(path)?,
        };

        let transformed = self
            .transform
            .transform(path, &source)
            .with_context(|| format!("{} failed on {:?}", self.transform.name(), path))?;

        Ok(match transformed {
            Ok(text) => vec![TransformResult::derived(output, text)],
            Err(issues) => issues
                .into_iter()
                .map(|issue| TransformResult::from_issue(path, issue))
                .collect(),
        })
    }

    fn outputs_for(&self, path: &Path) -> Vec<PathBuf> {
        self.rule.output_path(path).into_iter().collect()
    }
}
