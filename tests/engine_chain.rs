// tests/engine_chain.rs

use std::path::{Path, PathBuf};

use cascade::diagnostics::{Diagnostic, DiagnosticsSink};
use cascade::engine::{EngineContext, EngineSet};
use cascade::fs::mock::MockFileSystem;
use cascade::pipeline::{ChainReport, OutputIndex, run_chain};
use cascade::types::Severity;
use cascade_test_utils::builders::context;
use cascade_test_utils::fakes::{Behaviour, FakeEngine, FakeTemplateRunner, run_log};
use cascade_test_utils::init_tracing;

const FILE: &str = "/p/app.chirp.js";

struct Harness {
    fs: MockFileSystem,
    ctx: EngineContext,
    diagnostics: DiagnosticsSink,
    outputs: OutputIndex,
}

impl Harness {
    fn new() -> Self {
        init_tracing();
        let fs = MockFileSystem::new();
        fs.add_file(FILE, "let a = 1;");
        let ctx = context(&fs, Path::new("/p"), &FakeTemplateRunner::new());
        Self {
            fs,
            ctx,
            diagnostics: DiagnosticsSink::new(),
            outputs: OutputIndex::new(),
        }
    }

    fn run(&self, engines: &EngineSet) -> ChainReport {
        run_chain(engines, Path::new(FILE), &self.ctx, &self.diagnostics, &self.outputs)
    }
}

#[test]
fn test_only_the_highest_priority_transform_runs() {
    let h = Harness::new();
    let log = run_log();
    let engines = EngineSet::builder()
        .engine(FakeEngine::transform("short", ".js", 3).emitting(".short").log(&log).shared())
        .engine(FakeEngine::transform("long", ".chirp.js", 9).emitting(".long").log(&log).shared())
        .engine(FakeEngine::action("lint", ".js", 100).log(&log).shared())
        .build();

    let report = h.run(&engines);

    assert_eq!(report.ran, vec!["lint", "long"]);
    assert_eq!(report.skipped, vec!["short"]);
    let output = PathBuf::from("/p/app.chirp.js.long");
    assert_eq!(report.written, vec![output.clone()]);
    assert_eq!(h.fs.contents(&output).as_deref(), Some("long"));
    assert_eq!(h.outputs.source_of(&output), Some(PathBuf::from(FILE)));
    assert!(!report.short_circuited);
    assert_eq!(log.lock().len(), 2);
}

#[test]
fn test_actions_run_after_the_transform() {
    let h = Harness::new();
    let engines = EngineSet::builder()
        .engine(FakeEngine::action("late", ".js", 1).shared())
        .engine(FakeEngine::transform("minify", ".chirp.js", 9).emitting(".min").shared())
        .engine(FakeEngine::action("also-late", ".js", 1).shared())
        .build();

    let report = h.run(&engines);

    // Ties keep registration order.
    assert_eq!(report.ran, vec!["minify", "late", "also-late"]);
}

#[test]
fn test_error_diagnostic_stops_the_chain() {
    let h = Harness::new();
    let log = run_log();
    let engines = EngineSet::builder()
        .engine(FakeEngine::action("lint", ".js", 100).erroring("bad syntax").log(&log).shared())
        .engine(FakeEngine::transform("minify", ".chirp.js", 9).emitting(".min").log(&log).shared())
        .build();

    let report = h.run(&engines);

    assert!(report.short_circuited);
    assert_eq!(report.ran, vec!["lint"]);
    assert!(report.written.is_empty());
    assert!(h.diagnostics.has_errors(Path::new(FILE)));
    let diags = h.diagnostics.diagnostics_for(Path::new(FILE));
    assert_eq!(diags[0].message, "bad syntax");
    assert_eq!(diags[0].origin, PathBuf::from(FILE));
}

#[test]
fn test_warnings_do_not_stop_the_chain() {
    let h = Harness::new();
    let engines = EngineSet::builder()
        .engine(FakeEngine::action("lint", ".js", 100).warning("unused variable").shared())
        .engine(FakeEngine::transform("minify", ".chirp.js", 9).emitting(".min").shared())
        .build();

    let report = h.run(&engines);

    assert!(!report.short_circuited);
    assert_eq!(report.ran, vec!["lint", "minify"]);
    assert!(!h.diagnostics.has_errors(Path::new(FILE)));
    assert_eq!(
        h.diagnostics.diagnostics_for(Path::new(FILE))[0].severity,
        Severity::Warning
    );
}

#[test]
fn test_engine_failures_become_diagnostics() {
    let h = Harness::new();
    for (behaviour, needle) in [
        (Behaviour::Fail("disk on fire".to_string()), "disk on fire"),
        (Behaviour::Panic("index out of range".to_string()), "internal failure: index out of range"),
    ] {
        let engines = EngineSet::builder()
            .engine(FakeEngine::action("broken", ".js", 100).behaviour(behaviour).shared())
            .engine(FakeEngine::transform("minify", ".chirp.js", 9).emitting(".min").shared())
            .build();

        let report = h.run(&engines);

        assert!(report.short_circuited);
        let diags = h.diagnostics.diagnostics_for(Path::new(FILE));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.starts_with("broken: "));
        assert!(diags[0].message.contains(needle), "{}", diags[0].message);
    }
}

#[test]
fn test_previous_diagnostics_are_cleared_before_running() {
    let h = Harness::new();
    h.diagnostics
        .report(Diagnostic::error(Path::new(FILE), "stale"));
    let engines = EngineSet::builder()
        .engine(FakeEngine::transform("minify", ".chirp.js", 9).shared())
        .build();

    let report = h.run(&engines);

    assert_eq!(report.ran, vec!["minify"]);
    assert!(h.diagnostics.diagnostics_for(Path::new(FILE)).is_empty());
}

#[test]
fn test_unclaimed_file_runs_nothing_but_reports_dependents() {
    let h = Harness::new();
    let config = PathBuf::from("/p/site.chirp.config");
    h.ctx.deps.replace_config(&config, &[PathBuf::from(FILE)]);
    let engines = EngineSet::builder()
        .engine(FakeEngine::transform("css", ".css", 4).shared())
        .build();

    let report = h.run(&engines);

    assert!(report.ran.is_empty());
    assert_eq!(report.dependents, vec![config]);
}
