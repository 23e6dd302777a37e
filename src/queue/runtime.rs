// src/queue/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, error, info};

use crate::diagnostics::Diagnostic;
use crate::engine::EngineSet;
use crate::errors::Result;
use crate::pipeline::Pipeline;

/// Requests to the worker from outside the queue.
pub enum ControlEvent {
    /// Replace the engine set between two files.
    Reconfigure(EngineSet),
    Shutdown,
}

impl fmt::Debug for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlEvent::Reconfigure(set) => f
                .debug_tuple("Reconfigure")
                .field(&set.names())
                .finish(),
            ControlEvent::Shutdown => f.write_str("Shutdown"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerOptions {
    /// Exit once the queue is empty (used for `--once`).
    pub exit_when_idle: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub processed: usize,
    pub cascaded: usize,
}

/// The single consumer of the pipeline queue.
///
/// Files are processed one at a time on the blocking pool. Dependent configs
/// are enqueued only after a file's whole chain has finished.
pub struct Worker {
    pipeline: Arc<Pipeline>,
    control_rx: mpsc::Receiver<ControlEvent>,
    options: WorkerOptions,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

enum Flow {
    Continue,
    Stop,
}

impl Worker {
    pub fn new(
        pipeline: Arc<Pipeline>,
        control_rx: mpsc::Receiver<ControlEvent>,
        options: WorkerOptions,
    ) -> Self {
        Self {
            pipeline,
            control_rx,
            options,
        }
    }

    /// Main loop.
    ///
    /// - Applies pending control events.
    /// - Processes the next queued file, then enqueues its dependents.
    /// - When idle, waits for new work or a control event (or exits, with
    ///   `exit_when_idle`).
    pub async fn run(mut self) -> Result<WorkerSummary> {
        info!("cascade worker started");
        let mut summary = WorkerSummary::default();
        let mut control_open = true;

        loop {
            while control_open {
                match self.control_rx.try_recv() {
                    Ok(event) => {
                        if let Flow::Stop = self.handle_control(event) {
                            info!(?summary, "worker exiting");
                            return Ok(summary);
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        debug!("control channel closed");
                        control_open = false;
                    }
                }
            }

            if let Some(path) = self.pipeline.begin_next() {
                let pipeline = Arc::clone(&self.pipeline);
                let job_path = path.clone();
                let report =
                    tokio::task::spawn_blocking(move || pipeline.process_file(&job_path)).await;

                let dependents = match report {
                    Ok(report) => report.dependents,
                    Err(e) => {
                        error!(file = %path.display(), error = %e, "engine chain aborted");
                        self.pipeline
                            .diagnostics()
                            .report(Diagnostic::error(&path, format!("internal failure: {e}")));
                        self.pipeline.dependencies().dependents_of(&path)
                    }
                };

                self.pipeline.complete(&path);
                summary.processed += 1;

                for config in dependents {
                    debug!(file = %path.display(), config = %config.display(), "cascading rebuild");
                    self.pipeline.enqueue(&config);
                    summary.cascaded += 1;
                }
                continue;
            }

            if self.options.exit_when_idle {
                info!(?summary, "queue drained; worker exiting");
                return Ok(summary);
            }

            tokio::select! {
                _ = self.pipeline.notified() => {}
                event = self.control_rx.recv(), if control_open => match event {
                    Some(event) => {
                        if let Flow::Stop = self.handle_control(event) {
                            info!(?summary, "worker exiting");
                            return Ok(summary);
                        }
                    }
                    None => control_open = false,
                },
            }
        }
    }

    fn handle_control(&mut self, event: ControlEvent) -> Flow {
        match event {
            ControlEvent::Reconfigure(engines) => {
                self.pipeline.reconfigure(engines);
                Flow::Continue
            }
            ControlEvent::Shutdown => {
                info!("shutdown requested");
                Flow::Stop
            }
        }
    }
}
