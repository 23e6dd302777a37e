// src/types.rs

use std::fmt;

use serde::Deserialize;

/// Severity of a reported diagnostic.
///
/// Only `Error` marks a file as unhealthy; warnings are informational and
/// never stop the engine chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// How aggressively script sources are minified.
///
/// - `Full`: compress and mangle identifiers.
/// - `Simple`: compress only, identifiers are kept.
/// - `Whitespace`: strip whitespace and comments, no rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsMode {
    Full,
    Simple,
    Whitespace,
}

impl Default for JsMode {
    fn default() -> Self {
        JsMode::Full
    }
}
