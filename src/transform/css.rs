// src/transform/css.rs

//! Stylesheet collaborators backed by lightningcss.
//!
//! Style sources (`.less` included) are read as CSS with nesting. LESS
//! variables, mixins and operations are not supported.

use std::path::Path;
use std::sync::{Arc, RwLock};

use lightningcss::error::{Error as CssError, ErrorLocation};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use super::{Issue, Linter, TextTransform, Transformed};

fn issue_from<T: std::fmt::Display>(err: &CssError<T>) -> Issue {
    let (line, column) = position(err.loc.as_ref());
    Issue::error(err.kind.to_string(), line, column)
}

// lightningcss lines are 0-based, columns 1-based.
fn position(loc: Option<&ErrorLocation>) -> (u32, u32) {
    match loc {
        Some(loc) => (loc.line + 1, loc.column),
        None => (0, 0),
    }
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Transformed {
    let stylesheet = match StyleSheet::parse(source, ParserOptions::default()) {
        Ok(sheet) => sheet,
        Err(e) => return Err(vec![issue_from(&e)]),
    };
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| vec![issue_from(&e)])?;
    Ok(result.code)
}

/// Compile a style source into plain CSS.
///
/// Nested rules are flattened for the baseline browser targets; output is
/// pretty-printed. LESS-only syntax such as `@brand` references or
/// `.mixin();` calls is never evaluated.
pub fn compile_style(source: &str) -> Transformed {
    let stylesheet = match StyleSheet::parse(source, ParserOptions::default()) {
        Ok(sheet) => sheet,
        Err(e) => return Err(vec![issue_from(&e)]),
    };
    let targets = Targets::from(Browsers {
        chrome: Some(90 << 16),
        firefox: Some(88 << 16),
        safari: Some(14 << 16),
        ..Browsers::default()
    });
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: false,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| vec![issue_from(&e)])?;
    Ok(result.code)
}

/// Check a stylesheet, reporting recoverable problems as warnings and
/// unrecoverable ones as errors.
pub fn lint_css(source: &str) -> Vec<Issue> {
    let warnings = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        error_recovery: true,
        warnings: Some(Arc::clone(&warnings)),
        ..ParserOptions::default()
    };

    let mut issues = Vec::new();
    if let Err(e) = StyleSheet::parse(source, options) {
        issues.push(issue_from(&e));
    }

    let collected = match warnings.read() {
        Ok(guard) => guard
            .iter()
            .map(|w| {
                let (line, column) = position(w.loc.as_ref());
                Issue::warning(w.kind.to_string(), line, column)
            })
            .collect::<Vec<_>>(),
        Err(poisoned) => poisoned
            .into_inner()
            .iter()
            .map(|w| Issue::warning(w.kind.to_string(), 0, 0))
            .collect(),
    };
    issues.extend(collected);
    issues
}

#[derive(Debug, Clone, Default)]
pub struct CssMinifier;

impl TextTransform for CssMinifier {
    fn name(&self) -> &str {
        "css-minify"
    }

    fn transform(&self, _path: &Path, source: &str) -> anyhow::Result<Transformed> {
        Ok(minify_css(source))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StyleCompiler;

impl TextTransform for StyleCompiler {
    fn name(&self) -> &str {
        "style-compile"
    }

    fn transform(&self, _path: &Path, source: &str) -> anyhow::Result<Transformed> {
        Ok(compile_style(source))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CssLinter;

impl Linter for CssLinter {
    fn name(&self) -> &str {
        "css-lint"
    }

    fn lint(&self, _path: &Path, source: &str) -> anyhow::Result<Vec<Issue>> {
        Ok(lint_css(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    #[test]
    fn minify_strips_whitespace() {
        let out = minify_css("a {\n  color: red;\n}\n").unwrap();
        assert_eq!(out, "a{color:red}");
    }

    #[test]
    fn compile_flattens_nesting() {
        let out = compile_style(".nav { & .item { color: red; } }").unwrap();
        assert!(out.contains(".nav .item"), "got: {out}");
    }

    #[test]
    fn less_variables_are_not_resolved() {
        match compile_style("@brand: red;\n.a { color: @brand; }") {
            Ok(out) => {
                assert!(out.contains("@brand"), "got: {out}");
                assert!(!out.contains("color: red"), "got: {out}");
            }
            Err(issues) => assert!(!issues.is_empty()),
        }
    }

    #[test]
    fn lint_reports_recoverable_problems_as_warnings() {
        let issues = lint_css("a { color: red }\n$$$ { color: blue }\n");
        assert!(!issues.is_empty());
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
    }
}
