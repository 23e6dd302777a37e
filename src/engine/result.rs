// src/engine/result.rs

use std::path::PathBuf;

use crate::transform::Issue;
use crate::types::Severity;

/// Outcome item of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformResult {
    File(FileResult),
    Error(ErrorResult),
}

/// A file to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub path: PathBuf,
    pub content: String,
    /// Generated from another file, as opposed to a file the engine
    /// rewrites in place.
    pub is_derived: bool,
}

/// A diagnostic tied to a file position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResult {
    pub source_file: PathBuf,
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub severity: Severity,
}

impl TransformResult {
    pub fn derived(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        TransformResult::File(FileResult {
            path: path.into(),
            content: content.into(),
            is_derived: true,
        })
    }

    pub fn error(source_file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        TransformResult::Error(ErrorResult {
            source_file: source_file.into(),
            message: message.into(),
            line: 0,
            column: 0,
            severity: Severity::Error,
        })
    }

    pub fn warning(source_file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        TransformResult::Error(ErrorResult {
            source_file: source_file.into(),
            message: message.into(),
            line: 0,
            column: 0,
            severity: Severity::Warning,
        })
    }

    pub fn from_issue(source_file: impl Into<PathBuf>, issue: Issue) -> Self {
        TransformResult::Error(ErrorResult {
            source_file: source_file.into(),
            message: issue.message,
            line: issue.line,
            column: issue.column,
            severity: issue.severity,
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TransformResult::Error(_))
    }
}
