// src/queue/handle.rs

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::core::EnqueueOutcome;
use super::runtime::ControlEvent;
use crate::engine::EngineSet;
use crate::errors::{CascadeError, Result};
use crate::events::{self, EditorEvents};
use crate::pipeline::Pipeline;
use crate::settings::Settings;

/// Producer-side handle: enqueue files, report editor events, and steer the
/// worker.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    pipeline: Arc<Pipeline>,
    control: mpsc::Sender<ControlEvent>,
}

impl PipelineHandle {
    pub fn new(pipeline: Arc<Pipeline>, control: mpsc::Sender<ControlEvent>) -> Self {
        Self { pipeline, control }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn enqueue(&self, path: &Path) -> EnqueueOutcome {
        self.pipeline.enqueue(path)
    }

    pub fn remove(&self, path: &Path) -> bool {
        self.pipeline.remove(path)
    }

    pub fn is_handled(&self, path: &Path) -> bool {
        self.pipeline.is_handled(path)
    }

    pub fn is_transformed(&self, path: &Path) -> bool {
        self.pipeline.is_transformed(path)
    }

    /// Build an engine set from `settings` and hand it to the worker, which
    /// swaps it in between files.
    pub async fn reload(&self, settings: &Settings) -> Result<()> {
        let engines = EngineSet::from_settings(settings, self.pipeline.context());
        self.send(ControlEvent::Reconfigure(engines)).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(ControlEvent::Shutdown).await
    }

    async fn send(&self, event: ControlEvent) -> Result<()> {
        self.control
            .send(event)
            .await
            .map_err(|_| CascadeError::ChannelClosed("worker control channel".to_string()))
    }
}

impl EditorEvents for PipelineHandle {
    fn on_file_changed(&self, path: &Path) {
        events::file_changed(&self.pipeline, path);
    }

    fn on_file_renamed(&self, from: &Path, to: &Path) {
        events::file_renamed(&self.pipeline, from, to);
    }

    fn on_file_removed(&self, path: &Path) {
        events::file_removed(&self.pipeline, path);
    }
}
