// src/transform/mod.rs

//! External transform collaborators.
//!
//! Each collaborator is a pure function of its input text: it either returns
//! the transformed text or the problems it found. Nothing here touches the
//! filesystem or the pipeline state.
//!
//! - [`css`]: stylesheet minification, style compilation and linting
//!   (lightningcss).
//! - [`js`]: script minification in three modes and linting (oxc).

use std::fmt::Debug;
use std::path::Path;

use crate::types::Severity;

pub mod css;
pub mod js;

pub use css::{CssLinter, CssMinifier, StyleCompiler};
pub use js::{JsLinter, JsMinifier};

/// A problem reported by a collaborator, positioned in its input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub message: String,
    /// 1-based; 0 when unknown.
    pub line: u32,
    /// 1-based; 0 when unknown.
    pub column: u32,
    pub severity: Severity,
}

impl Issue {
    pub fn error(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            severity: Severity::Warning,
        }
    }
}

/// Transformed text, or the reasons the input could not be transformed.
pub type Transformed = Result<String, Vec<Issue>>;

/// Text in, text or issues out.
///
/// `Ok(Err(issues))` is an expected failure (malformed input). An outer
/// `Err` means the collaborator itself failed.
pub trait TextTransform: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn transform(&self, path: &Path, source: &str) -> anyhow::Result<Transformed>;
}

/// Text in, issues out. An empty list means the input is clean.
pub trait Linter: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn lint(&self, path: &Path, source: &str) -> anyhow::Result<Vec<Issue>>;
}

/// Translate a byte offset into a 1-based (line, column) pair.
///
/// Offsets past the end clamp to the last position.
pub fn line_col(text: &str, offset: usize) -> (u32, u32) {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line as u32, column as u32)
}
