// src/engine/mod.rs

//! Engine contract and the engine registry.
//!
//! An engine answers two questions about a file: "do I handle it, and with
//! what priority" ([`Engine::classify`]) and "process it"
//! ([`Engine::run`]). Engines come in two kinds:
//!
//! - transform engines produce a derived file and are mutually exclusive on
//!   a given file; only the highest-priority one runs,
//! - action engines have side effects (linting, template regeneration) and
//!   every matching one runs.
//!
//! The ordered set of engines built from settings lives in [`registry`].

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;

pub mod lint;
pub mod registry;
pub mod result;
pub mod suffix;
pub mod template;

pub use lint::LintEngine;
pub use registry::{EngineContext, EngineSet, EngineSetBuilder, RankedEngine};
pub use result::{ErrorResult, FileResult, TransformResult};
pub use suffix::{SuffixRule, SuffixTransformEngine};
pub use template::TemplateEngine;

/// Claim strength of an engine for a file. `0` means "not mine".
pub type Priority = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Transform,
    Action,
}

/// Capability every engine implements.
///
/// Engines are shared between the worker and producers, so they must be
/// `Send + Sync`; any interior state needs its own synchronisation.
pub trait Engine: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn kind(&self) -> EngineKind;

    /// Pure; `0` when the file is not handled. Must also be `0` for files
    /// carrying this engine's own output extension.
    fn classify(&self, path: &Path) -> Priority;

    /// Process `path`. `content` is used instead of reading the file when
    /// supplied.
    ///
    /// Malformed input is reported through [`TransformResult::Error`]; an
    /// `Err` is reserved for I/O and collaborator failures.
    fn run(&self, path: &Path, content: Option<&str>) -> anyhow::Result<Vec<TransformResult>>;

    /// Derived files this engine would write for `path`.
    fn outputs_for(&self, _path: &Path) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Release resources before the engine set is replaced.
    ///
    /// Deferred work is started rather than dropped; the returned handles
    /// resolve once it has finished.
    fn dispose(&self) -> Vec<JoinHandle<()>> {
        Vec::new()
    }
}
