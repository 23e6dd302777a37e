// src/transform/js.rs

//! Script collaborators backed by oxc.

use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::diagnostics::OxcDiagnostic;
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::{Issue, Linter, TextTransform, Transformed, line_col};
use crate::types::JsMode;

fn issues_from(source: &str, errors: &[OxcDiagnostic]) -> Vec<Issue> {
    errors
        .iter()
        .map(|err| {
            let offset = err
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| label.offset());
            let (line, column) = match offset {
                Some(offset) => line_col(source, offset),
                None => (0, 0),
            };
            Issue::error(err.to_string(), line, column)
        })
        .collect()
}

/// Minify JavaScript source code with the given mode.
///
/// Sources are parsed as classic scripts, so top-level declarations are
/// globals: they are neither removed nor renamed.
pub fn minify_js(source: &str, mode: JsMode) -> Transformed {
    let allocator = Allocator::default();
    let source_type = SourceType::script();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return Err(issues_from(source, &ret.errors));
    }
    let mut program = ret.program;

    let codegen = Codegen::new().with_options(CodegenOptions {
        minify: true,
        comments: CommentOptions::disabled(),
        ..CodegenOptions::default()
    });

    let options = match mode {
        JsMode::Full => MinifierOptions {
            mangle: Some(MangleOptions::default()),
            compress: Some(CompressOptions::smallest()),
        },
        JsMode::Simple => MinifierOptions {
            mangle: None,
            compress: Some(CompressOptions::default()),
        },
        JsMode::Whitespace => {
            return Ok(codegen.build(&program).code);
        }
    };

    let ret = Minifier::new(options).minify(&allocator, &mut program);
    Ok(codegen.with_scoping(ret.scoping).build(&program).code)
}

/// Report syntax errors in a script.
pub fn lint_js(source: &str) -> Vec<Issue> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::script()).parse();
    issues_from(source, &ret.errors)
}

#[derive(Debug, Clone, Default)]
pub struct JsMinifier {
    mode: JsMode,
}

impl JsMinifier {
    pub fn new(mode: JsMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> JsMode {
        self.mode
    }
}

impl TextTransform for JsMinifier {
    fn name(&self) -> &str {
        match self.mode {
            JsMode::Full => "js-minify",
            JsMode::Simple => "js-minify-simple",
            JsMode::Whitespace => "js-minify-whitespace",
        }
    }

    fn transform(&self, _path: &Path, source: &str) -> anyhow::Result<Transformed> {
        Ok(minify_js(source, self.mode))
    }
}

#[derive(Debug, Clone, Default)]
pub struct JsLinter;

impl Linter for JsLinter {
    fn name(&self) -> &str {
        "js-lint"
    }

    fn lint(&self, _path: &Path, source: &str) -> anyhow::Result<Vec<Issue>> {
        Ok(lint_js(source))
    }
}
