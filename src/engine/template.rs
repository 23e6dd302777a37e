// src/engine/template.rs

//! Debounced template regeneration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use globset::GlobSet;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Engine, EngineKind, Priority, TransformResult};
use crate::exec::TemplateRunner;
use crate::fs::relative_str;

/// Action engine that reruns a template command once trigger files stop
/// changing.
///
/// Each run restarts the debounce timer; the command fires once the timer
/// expires without another run. A command that has already started is not
/// interrupted. Disposing the engine fires a pending command immediately.
#[derive(Debug)]
pub struct TemplateEngine {
    triggers: GlobSet,
    root: PathBuf,
    debounce: Duration,
    job: Arc<Regenerate>,
    schedule: Arc<Mutex<Schedule>>,
}

#[derive(Debug)]
struct Regenerate {
    runner: Arc<dyn TemplateRunner>,
    command: String,
    cwd: PathBuf,
}

impl Regenerate {
    fn spawn(self: &Arc<Self>, handle: &Handle) -> JoinHandle<()> {
        let job = Arc::clone(self);
        handle.spawn(async move {
            if let Err(e) = job.runner.run(&job.command, &job.cwd).await {
                warn!(cmd = %job.command, error = %e, "template command failed");
            }
        })
    }
}

#[derive(Debug, Default)]
struct Schedule {
    timer: Option<JoinHandle<()>>,
    /// Timer allowed to fire; cleared once it fires or is flushed.
    armed: Option<u64>,
    next_id: u64,
    /// Commands started and not yet handed out by `dispose`.
    commands: Vec<JoinHandle<()>>,
}

impl TemplateEngine {
    pub fn new(
        triggers: GlobSet,
        root: impl Into<PathBuf>,
        command: impl Into<String>,
        debounce: Duration,
        runner: Arc<dyn TemplateRunner>,
    ) -> Self {
        let root = root.into();
        Self {
            triggers,
            job: Arc::new(Regenerate {
                runner,
                command: command.into(),
                cwd: root.clone(),
            }),
            root,
            debounce,
            schedule: Arc::new(Mutex::new(Schedule::default())),
        }
    }
}

impl Engine for TemplateEngine {
    fn name(&self) -> &str {
        "template"
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Action
    }

    fn classify(&self, path: &Path) -> Priority {
        match relative_str(&self.root, path) {
            Some(rel) if self.triggers.is_match(&rel) => 1,
            _ => 0,
        }
    }

    fn run(&self, path: &Path, _content: Option<&str>) -> anyhow::Result<Vec<TransformResult>> {
        let handle =
            Handle::try_current().map_err(|_| anyhow!("template engine needs a tokio runtime"))?;

        let mut schedule = self.schedule.lock();
        schedule.next_id += 1;
        let id = schedule.next_id;
        schedule.armed = Some(id);

        let job = Arc::clone(&self.job);
        let shared = Arc::clone(&self.schedule);
        let delay = self.debounce;
        let spawner = handle.clone();
        let timer = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut schedule = shared.lock();
            if schedule.armed != Some(id) {
                return;
            }
            schedule.armed = None;
            schedule.timer = None;
            schedule.commands.retain(|c| !c.is_finished());
            let command = job.spawn(&spawner);
            schedule.commands.push(command);
        });

        if let Some(previous) = schedule.timer.replace(timer) {
            previous.abort();
        }
        drop(schedule);
        debug!(file = %path.display(), delay_ms = delay.as_millis() as u64, "template regeneration scheduled");

        Ok(Vec::new())
    }

    fn dispose(&self) -> Vec<JoinHandle<()>> {
        let mut schedule = self.schedule.lock();
        if let Some(timer) = schedule.timer.take() {
            timer.abort();
        }
        if schedule.armed.take().is_some() {
            match Handle::try_current() {
                Ok(handle) => {
                    debug!(cmd = %self.job.command, "pending template regeneration flushed");
                    let command = self.job.spawn(&handle);
                    schedule.commands.push(command);
                }
                Err(_) => {
                    warn!(cmd = %self.job.command, "no tokio runtime; pending template regeneration dropped");
                }
            }
        }
        std::mem::take(&mut schedule.commands)
    }
}
