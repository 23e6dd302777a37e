// src/lib.rs

pub mod aggregate;
pub mod cli;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod events;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod queue;
pub mod settings;
pub mod transform;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::aggregate::DependencyMap;
use crate::cli::CliArgs;
use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink};
use crate::engine::{EngineContext, EngineSet};
use crate::exec::ShellTemplateRunner;
use crate::fs::{FileSystem, RealFileSystem, walk_files};
use crate::pipeline::Pipeline;
use crate::queue::{ControlEvent, PipelineHandle, Worker, WorkerOptions};
use crate::settings::load_or_default;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading
/// - engine set / dependency map / pipeline
/// - the worker
/// - (optional) file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let settings_path = PathBuf::from(&args.settings);
    let settings = load_or_default(&settings_path)?;

    let root = match args.root.as_deref() {
        Some(dir) => PathBuf::from(dir),
        None => settings_root_dir(&settings_path),
    };
    let root = root.canonicalize().unwrap_or(root);

    let context = EngineContext {
        fs: Arc::new(RealFileSystem),
        deps: Arc::new(DependencyMap::new()),
        template_runner: Arc::new(ShellTemplateRunner),
        root: root.clone(),
    };
    let engines = EngineSet::from_settings(&settings, &context);

    if args.dry_run {
        print_dry_run(&engines, context.fs.as_ref(), &root)?;
        return Ok(());
    }

    let diagnostics = Arc::new(DiagnosticsSink::new());
    let pipeline = Arc::new(Pipeline::new(engines, context, Arc::clone(&diagnostics)));
    pipeline.prime_dependencies(&root)?;

    let (control_tx, control_rx) = mpsc::channel::<ControlEvent>(16);
    let handle = PipelineHandle::new(Arc::clone(&pipeline), control_tx);

    let _watcher_handle = if args.once {
        pipeline.scan(&root)?;
        None
    } else {
        tokio::spawn(print_diagnostics(diagnostics.subscribe()));
        Some(crate::watch::spawn_watcher(&root, &settings_path, handle.clone())?)
    };

    // Ctrl-C → graceful shutdown.
    {
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = handle.shutdown().await;
        });
    }

    let options = WorkerOptions {
        exit_when_idle: args.once,
    };
    let summary = Worker::new(Arc::clone(&pipeline), control_rx, options)
        .run()
        .await?;
    for task in pipeline.engines().dispose() {
        if let Err(e) = task.await {
            warn!(error = %e, "engine task did not finish");
        }
    }
    info!(processed = summary.processed, cascaded = summary.cascaded, "cascade finished");

    if args.once {
        for diagnostic in diagnostics.all() {
            println!("[cascade] {diagnostic}");
        }
        let errors = diagnostics.error_count();
        if errors > 0 {
            bail!("{errors} error(s) reported");
        }
    }

    Ok(())
}

/// Project root when `--root` is not given.
///
/// - If the settings path has a non-empty parent (e.g. "web/Cascade.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Cascade.toml" (parent = ""),
///   we fall back to the current working directory "."
fn settings_root_dir(settings_path: &Path) -> PathBuf {
    match settings_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print diagnostic changes as they happen.
async fn print_diagnostics(mut rx: broadcast::Receiver<DiagnosticEvent>) {
    loop {
        match rx.recv().await {
            Ok(DiagnosticEvent::Reported(diagnostic)) => println!("[cascade] {diagnostic}"),
            Ok(DiagnosticEvent::Cleared { file }) => {
                debug!(file = %file.display(), "diagnostics cleared");
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!(skipped = n, "diagnostics printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Dry-run output: the engine set, then every handled file with the engines
/// that would run on it.
fn print_dry_run(engines: &EngineSet, fs: &dyn FileSystem, root: &Path) -> Result<()> {
    println!("cascade dry-run");
    println!("  root = {}", root.display());
    if let Some(suffix) = engines.config_suffix() {
        println!("  aggregate.suffix = {suffix}");
    }
    println!();

    println!("engines ({}):", engines.len());
    for engine in engines.engines() {
        println!("  - {} ({:?})", engine.name(), engine.kind());
    }
    println!();

    println!("files:");
    for file in walk_files(fs, root)? {
        if engines.is_ignored(&file) {
            continue;
        }
        let ranked = engines.ranked(&file);
        if ranked.is_empty() {
            continue;
        }
        let rel = crate::fs::relative_str(root, &file).unwrap_or_else(|| file.display().to_string());
        let chain: Vec<String> = ranked
            .iter()
            .map(|r| format!("{}:{}", r.engine.name(), r.priority))
            .collect();
        println!("  {rel}: {}", chain.join(", "));
    }

    debug!("dry-run complete (nothing written)");
    Ok(())
}
