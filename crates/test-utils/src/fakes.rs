//! Test doubles for engines, transforms and the template runner.
#![allow(dead_code)]

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use parking_lot::Mutex;

use cascade::engine::{Engine, EngineKind, Priority, TransformResult};
use cascade::errors::{CascadeError, Result};
use cascade::exec::TemplateRunner;
use cascade::transform::{Issue, TextTransform, Transformed};
use cascade::types::Severity;

/// Shared record of `(engine, file)` runs, in order.
pub type RunLog = Arc<Mutex<Vec<(String, PathBuf)>>>;

pub fn run_log() -> RunLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// What a [`FakeEngine`] does when it runs.
#[derive(Debug, Clone)]
pub enum Behaviour {
    Nothing,
    /// Write `<file><suffix>` containing the engine name.
    Emit { suffix: String },
    Diagnose { severity: Severity, message: String },
    Fail(String),
    Panic(String),
}

/// Engine that claims files by suffix with a fixed priority.
#[derive(Debug)]
pub struct FakeEngine {
    name: String,
    kind: EngineKind,
    suffix: String,
    priority: Priority,
    behaviour: Behaviour,
    log: RunLog,
}

impl FakeEngine {
    pub fn transform(name: &str, suffix: &str, priority: Priority) -> Self {
        Self::new(name, EngineKind::Transform, suffix, priority)
    }

    pub fn action(name: &str, suffix: &str, priority: Priority) -> Self {
        Self::new(name, EngineKind::Action, suffix, priority)
    }

    fn new(name: &str, kind: EngineKind, suffix: &str, priority: Priority) -> Self {
        Self {
            name: name.to_string(),
            kind,
            suffix: suffix.to_ascii_lowercase(),
            priority,
            behaviour: Behaviour::Nothing,
            log: run_log(),
        }
    }

    pub fn behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn emitting(self, suffix: &str) -> Self {
        self.behaviour(Behaviour::Emit {
            suffix: suffix.to_string(),
        })
    }

    pub fn erroring(self, message: &str) -> Self {
        self.behaviour(Behaviour::Diagnose {
            severity: Severity::Error,
            message: message.to_string(),
        })
    }

    pub fn warning(self, message: &str) -> Self {
        self.behaviour(Behaviour::Diagnose {
            severity: Severity::Warning,
            message: message.to_string(),
        })
    }

    pub fn log(mut self, log: &RunLog) -> Self {
        self.log = Arc::clone(log);
        self
    }

    pub fn shared(self) -> Arc<dyn Engine> {
        Arc::new(self)
    }
}

impl Engine for FakeEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn classify(&self, path: &Path) -> Priority {
        let name = path.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(&self.suffix) {
            self.priority
        } else {
            0
        }
    }

    fn run(&self, path: &Path, _content: Option<&str>) -> anyhow::Result<Vec<TransformResult>> {
        self.log.lock().push((self.name.clone(), path.to_path_buf()));
        match &self.behaviour {
            Behaviour::Nothing => Ok(Vec::new()),
            Behaviour::Emit { suffix } => {
                let out = PathBuf::from(format!("{}{}", path.display(), suffix));
                Ok(vec![TransformResult::derived(out, self.name.clone())])
            }
            Behaviour::Diagnose { severity, message } => {
                let issue = match severity {
                    Severity::Error => Issue::error(message.clone(), 1, 1),
                    Severity::Warning => Issue::warning(message.clone(), 1, 1),
                };
                Ok(vec![TransformResult::from_issue(path, issue)])
            }
            Behaviour::Fail(message) => Err(anyhow!("{message}")),
            Behaviour::Panic(message) => panic!("{message}"),
        }
    }
}

type TransformFn = dyn Fn(&str) -> Transformed + Send + Sync;

/// [`TextTransform`] backed by a closure.
pub struct FakeTransform {
    name: String,
    f: Box<TransformFn>,
}

impl FakeTransform {
    pub fn new(name: &str, f: impl Fn(&str) -> Transformed + Send + Sync + 'static) -> Self {
        Self {
            name: name.to_string(),
            f: Box::new(f),
        }
    }

    /// Wraps the input as `name(input)`.
    pub fn wrapping(name: &str) -> Self {
        let tag = name.to_string();
        Self::new(name, move |src| Ok(format!("{tag}({src})")))
    }

    /// Rejects every input with one error issue.
    pub fn rejecting(name: &str, message: &str) -> Self {
        let message = message.to_string();
        Self::new(name, move |_| Err(vec![Issue::error(message.clone(), 2, 3)]))
    }

    pub fn shared(self) -> Arc<dyn TextTransform> {
        Arc::new(self)
    }
}

impl fmt::Debug for FakeTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeTransform")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TextTransform for FakeTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, _path: &Path, source: &str) -> anyhow::Result<Transformed> {
        Ok((self.f)(source))
    }
}

/// Records template commands instead of running them.
#[derive(Debug, Clone, Default)]
pub struct FakeTemplateRunner {
    runs: Arc<Mutex<Vec<(String, PathBuf)>>>,
    delay: Duration,
    fail: bool,
}

impl FakeTemplateRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each run takes `delay` before resolving.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn runs(&self) -> Vec<(String, PathBuf)> {
        self.runs.lock().clone()
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().len()
    }
}

impl TemplateRunner for FakeTemplateRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
        cwd: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.runs
                .lock()
                .push((command.to_string(), cwd.to_path_buf()));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(CascadeError::Other(anyhow!("template command failed: {command}")));
            }
            Ok(())
        })
    }
}
