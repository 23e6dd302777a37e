// src/engine/lint.rs

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use super::{Engine, EngineKind, Priority, SuffixRule, TransformResult};
use crate::fs::FileSystem;
use crate::transform::Linter;

/// Action engine that reports a linter's findings as diagnostics.
///
/// Every handled file gets the same configured priority, so linting runs
/// ahead of the transform engines for that file.
#[derive(Debug)]
pub struct LintEngine {
    name: String,
    rule: SuffixRule,
    priority: Priority,
    linter: Arc<dyn Linter>,
    fs: Arc<dyn FileSystem>,
}

impl LintEngine {
    pub fn new(
        name: impl Into<String>,
        rule: SuffixRule,
        priority: Priority,
        linter: Arc<dyn Linter>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            name: name.into(),
            rule,
            priority,
            linter,
            fs,
        }
    }
}

impl Engine for LintEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Action
    }

    fn classify(&self, path: &Path) -> Priority {
        if self.rule.matched(path).is_some() {
            self.priority
        } else {
            0
        }
    }

    fn run(&self, path: &Path, content: Option<&str>) -> anyhow::Result<Vec<TransformResult>> {
        let source = match content {
            Some(text) => text.to_string(),
            None => self.fs.read_to_string(path)?,
        };
        let issues = self
            .linter
            .lint(path, &source)
            .with_context(|| format!("{} failed on {:?}", self.linter.name(), path))?;
        Ok(issues
            .into_iter()
            .map(|issue| TransformResult::from_issue(path, issue))
            .collect())
    }
}
