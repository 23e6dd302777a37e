// src/pipeline/chain.rs

//! The per-file engine chain.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::outputs::OutputIndex;
use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::engine::{EngineContext, EngineKind, EngineSet, TransformResult};

/// What happened while processing one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainReport {
    pub path: PathBuf,
    /// Engines that ran, in order.
    pub ran: Vec<String>,
    /// Transform engines passed over because a higher one already ran.
    pub skipped: Vec<String>,
    pub written: Vec<PathBuf>,
    /// Stopped early because the file had errors.
    pub short_circuited: bool,
    /// Configs to rebuild now that this file is done.
    pub dependents: Vec<PathBuf>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run every engine claiming `path`.
///
/// 1. Clear the file's diagnostics.
/// 2. Run engines by descending priority. Action engines always run; only
///    the first transform engine does.
/// 3. Stop as soon as the file has an error diagnostic.
/// 4. Collect the configs that depend on the file.
///
/// Engine failures and panics become diagnostics on the file; this function
/// never fails.
pub fn run_chain(
    engines: &EngineSet,
    path: &Path,
    ctx: &EngineContext,
    diagnostics: &DiagnosticsSink,
    outputs: &OutputIndex,
) -> ChainReport {
    let mut report = ChainReport {
        path: path.to_path_buf(),
        ..ChainReport::default()
    };

    diagnostics.clear(path);

    let mut transform_ran = false;
    for ranked in engines.ranked(path) {
        let engine = &ranked.engine;
        let is_transform = engine.kind() == EngineKind::Transform;
        if is_transform && transform_ran {
            debug!(file = %path.display(), engine = engine.name(), "transform already ran; skipping");
            report.skipped.push(engine.name().to_string());
            continue;
        }

        if engines.detail_log() {
            info!(engine = engine.name(), priority = ranked.priority, "{} -- {}", engine.name(), path.display());
        } else {
            debug!(engine = engine.name(), priority = ranked.priority, file = %path.display(), "running engine");
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| engine.run(path, None)));
        report.ran.push(engine.name().to_string());
        if is_transform {
            transform_ran = true;
        }

        match outcome {
            Ok(Ok(results)) => {
                for result in results {
                    match result {
                        TransformResult::File(file) => match ctx.fs.write(&file.path, file.content.as_bytes()) {
                            Ok(()) => {
                                if file.is_derived {
                                    outputs.record(path, &file.path);
                                }
                                debug!(output = %file.path.display(), "output written");
                                report.written.push(file.path);
                            }
                            Err(e) => diagnostics.report(Diagnostic::error(
                                path,
                                format!("{}: cannot write {}: {e:#}", engine.name(), file.path.display()),
                            )),
                        },
                        TransformResult::Error(err) => {
                            diagnostics.report(Diagnostic::from_result(path, err));
                        }
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(file = %path.display(), engine = engine.name(), error = %e, "engine failed");
                diagnostics.report(Diagnostic::error(path, format!("{}: {e:#}", engine.name())));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(file = %path.display(), engine = engine.name(), panic = %message, "engine panicked");
                diagnostics.report(Diagnostic::error(
                    path,
                    format!("{}: internal failure: {message}", engine.name()),
                ));
            }
        }

        if diagnostics.has_errors(path) {
            debug!(file = %path.display(), engine = engine.name(), "file has errors; stopping chain");
            report.short_circuited = true;
            break;
        }
    }

    report.dependents = ctx.deps.dependents_of(path);
    report
}
