// tests/transforms.rs

use std::path::{Path, PathBuf};

use cascade::diagnostics::DiagnosticsSink;
use cascade::engine::{EngineContext, EngineSet};
use cascade::fs::FileSystem;
use cascade::fs::mock::MockFileSystem;
use cascade::pipeline::{ChainReport, OutputIndex, run_chain};
use cascade::types::Severity;
use cascade_test_utils::builders::{SettingsBuilder, context};
use cascade_test_utils::fakes::FakeTemplateRunner;

struct Project {
    fs: MockFileSystem,
    engines: EngineSet,
    ctx: EngineContext,
    diagnostics: DiagnosticsSink,
    outputs: OutputIndex,
}

impl Project {
    fn new(files: &[(&str, &str)]) -> Self {
        let fs = MockFileSystem::new();
        for (path, content) in files {
            fs.add_file(path, *content);
        }
        let ctx = context(&fs, Path::new("/p"), &FakeTemplateRunner::new());
        let engines = EngineSet::from_settings(&SettingsBuilder::new().build(), &ctx);
        Self {
            fs,
            engines,
            ctx,
            diagnostics: DiagnosticsSink::new(),
            outputs: OutputIndex::new(),
        }
    }

    fn build(&self, path: &str) -> ChainReport {
        run_chain(&self.engines, Path::new(path), &self.ctx, &self.diagnostics, &self.outputs)
    }
}

#[test]
fn test_default_engine_set_claims_by_suffix() {
    let p = Project::new(&[]);
    let names = |path: &str| -> Vec<String> {
        p.engines
            .ranked(Path::new(path))
            .iter()
            .map(|r| r.engine.name().to_string())
            .collect()
    };

    assert_eq!(names("/p/site.chirp.css"), vec!["lint-css", "css"]);
    assert_eq!(names("/p/site.chirp.less"), vec!["style"]);
    assert_eq!(names("/p/app.chirp.js"), vec!["lint-js", "js"]);
    assert_eq!(names("/p/app.simple.js"), vec!["lint-js", "js-simple"]);
    assert_eq!(names("/p/app.whitespace.js"), vec!["lint-js", "js-whitespace"]);
    assert_eq!(names("/p/site.chirp.config"), vec!["config"]);
    // Generated outputs are left alone.
    assert!(names("/p/site.min.css").is_empty());
    assert!(names("/p/app.min.js").is_empty());
    assert!(p.engines.is_transformed(Path::new("/p/a.chirp.js")));
    assert!(!p.engines.is_transformed(Path::new("/p/a.js")));
    assert!(p.engines.is_handled(Path::new("/p/a.js")));
}

#[test]
fn test_css_is_minified_next_to_its_source() {
    let p = Project::new(&[("/p/site.chirp.css", "a {\n  color: red;\n}\n")]);
    let report = p.build("/p/site.chirp.css");

    assert_eq!(report.written, vec![PathBuf::from("/p/site.min.css")]);
    assert_eq!(p.fs.contents("/p/site.min.css").as_deref(), Some("a{color:red}"));
    assert_eq!(
        p.engines.outputs_for(Path::new("/p/site.chirp.css")),
        vec![PathBuf::from("/p/site.min.css")]
    );
}

#[test]
fn test_style_sources_compile_to_plain_css() {
    let p = Project::new(&[("/p/theme.chirp.less", ".card { & .title { color: red; } }")]);
    let report = p.build("/p/theme.chirp.less");

    assert_eq!(report.written, vec![PathBuf::from("/p/theme.css")]);
    let css = p.fs.contents("/p/theme.css").unwrap();
    assert!(css.contains(".card .title"), "{css}");
}

#[test]
fn test_js_modes_differ_in_aggressiveness() {
    let source = "function add(first, second) {\n  // sum\n  var total = first + second;\n  return total;\n}\nvar offset = add(1, 2);\n";
    let p = Project::new(&[
        ("/p/full.chirp.js", source),
        ("/p/keep.whitespace.js", source),
    ]);
    p.build("/p/full.chirp.js");
    p.build("/p/keep.whitespace.js");

    let full = p.fs.contents("/p/full.min.js").unwrap();
    let whitespace = p.fs.contents("/p/keep.min.js").unwrap();
    assert!(!whitespace.contains("// sum"));
    assert!(whitespace.contains("first"));
    assert!(full.len() <= whitespace.len());
    // top-level bindings are globals in a script and must keep their names
    assert!(full.contains("function add("), "{full}");
    assert!(full.contains("offset"), "{full}");
    assert!(!full.contains("total"), "{full}");
}

#[test]
fn test_lint_errors_stop_minification() {
    let p = Project::new(&[("/p/broken.chirp.js", "function (")]);
    let report = p.build("/p/broken.chirp.js");

    assert!(report.short_circuited);
    assert_eq!(report.ran, vec!["lint-js"]);
    assert!(!p.fs.is_file(Path::new("/p/broken.min.js")));
    let diags = p.diagnostics.diagnostics_for(Path::new("/p/broken.chirp.js"));
    assert!(!diags.is_empty());
    assert!(diags.iter().all(|d| d.severity == Severity::Error));
}

#[test]
fn test_css_lint_warnings_do_not_stop_the_chain() {
    let p = Project::new(&[("/p/site.chirp.css", "a { color: red }\n$$$ { color: blue }\n")]);
    let report = p.build("/p/site.chirp.css");

    let diags = p.diagnostics.diagnostics_for(Path::new("/p/site.chirp.css"));
    assert!(diags.iter().any(|d| d.severity == Severity::Warning));
    assert_eq!(report.ran, vec!["lint-css", "css"]);
}
