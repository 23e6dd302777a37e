// tests/runtime_pipeline.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cascade::diagnostics::DiagnosticEvent;
use cascade::events::{EditorEvents, FileEvent};
use cascade::fs::FileSystem;
use cascade::fs::mock::MockFileSystem;
use cascade::queue::{EnqueueOutcome, FilterReason, PipelineHandle, Worker, WorkerOptions};
use cascade_test_utils::builders::{PipelineFixture, SettingsBuilder};
use cascade_test_utils::{init_tracing, with_timeout};
use tokio::sync::mpsc;

const SITE_CONFIG: &str = r#"<root>
  <FileGroup Name="site.css">
    <File Path="a.css" />
    <File Path="b.css" Minify="true" />
  </FileGroup>
</root>"#;

fn site_project() -> PipelineFixture {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/a.css", "a { color: red }");
    fs.add_file("/p/b.css", "b { color: red }");
    fs.add_file("/p/site.chirp.config", SITE_CONFIG);
    let fx = PipelineFixture::from_settings(fs, "/p", &SettingsBuilder::new().build());
    fx.pipeline.prime_dependencies(Path::new("/p")).unwrap();
    fx
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_member_changes_rebuild_the_config_once() {
    let fx = site_project();
    let site_css = fx.path("site.css");

    fx.pipeline.on_file_changed(&fx.path("a.css"));
    fx.pipeline.on_file_changed(&fx.path("b.css"));
    assert_eq!(fx.pipeline.pending().len(), 2);

    let summary = with_timeout(fx.drain()).await;

    assert_eq!(summary.processed, 3);
    assert_eq!(fx.fs.write_count(&site_css), 1);
    assert_eq!(
        fx.fs.contents(&site_css).as_deref(),
        Some("a { color: red }\nb{color:red}")
    );
    assert!(fx.pipeline.is_idle());
    assert!(fx.pipeline.diagnostics().all().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scan_builds_each_config_once() {
    let fx = site_project();

    let queued = fx.pipeline.scan(Path::new("/p")).unwrap();
    assert_eq!(
        queued,
        vec![fx.path("a.css"), fx.path("b.css"), fx.path("site.chirp.config")]
    );

    let summary = with_timeout(fx.drain()).await;

    assert_eq!(summary.processed, 3);
    assert_eq!(fx.fs.write_count(fx.path("site.css")), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_outputs_are_not_fed_back_into_the_queue() {
    let fx = site_project();
    fx.pipeline.on_file_changed(&fx.path("site.chirp.config"));
    with_timeout(fx.drain()).await;

    let site_css = fx.path("site.css");
    assert!(fx.fs.is_file(&site_css));
    assert_eq!(
        fx.pipeline.enqueue(&site_css),
        EnqueueOutcome::Filtered(FilterReason::DerivedOutput)
    );
    assert!(fx.pipeline.is_idle());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unrelated_files_are_not_queued() {
    let fx = site_project();
    fx.fs.add_file("/p/notes.txt", "hello");

    fx.pipeline.on_file_changed(&fx.path("notes.txt"));
    // Directories never queue.
    fx.pipeline.on_file_changed(Path::new("/p"));

    assert!(fx.pipeline.pending().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_removed_source_takes_its_output_along() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/app.chirp.js", "var answer = 40 + 2;");
    let fx = PipelineFixture::from_settings(fs, "/p", &SettingsBuilder::new().build());

    fx.pipeline.on_file_changed(&fx.path("app.chirp.js"));
    with_timeout(fx.drain()).await;
    let output = fx.path("app.min.js");
    assert!(fx.fs.is_file(&output));
    assert!(fx.pipeline.is_transformed(&fx.path("app.chirp.js")));

    fx.fs.remove_file(&fx.path("app.chirp.js")).unwrap();
    fx.pipeline
        .dispatch(FileEvent::Removed(fx.path("app.chirp.js")));

    assert!(!fx.fs.is_file(&output));
    assert!(fx.pipeline.outputs().outputs_of(&fx.path("app.chirp.js")).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_removed_member_rebuilds_dependents() {
    let fx = site_project();
    with_timeout(async {
        fx.pipeline.on_file_changed(&fx.path("site.chirp.config"));
        fx.drain().await
    })
    .await;

    fx.fs.remove_file(&fx.path("b.css")).unwrap();
    fx.pipeline.on_file_removed(&fx.path("b.css"));
    assert_eq!(fx.pipeline.pending(), vec![fx.path("site.chirp.config")]);

    with_timeout(fx.drain()).await;

    assert_eq!(
        fx.fs.contents(fx.path("site.css")).as_deref(),
        Some("a { color: red }\n")
    );
    let diags = fx.pipeline.diagnostics().diagnostics_for(&fx.path("b.css"));
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].origin, fx.path("site.chirp.config"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_renamed_member_queues_both_sides() {
    let fx = site_project();
    fx.fs.add_file("/p/c.css", "a { color: red }");

    fx.pipeline.on_file_renamed(&fx.path("a.css"), &fx.path("c.css"));

    assert_eq!(
        fx.pipeline.pending(),
        vec![fx.path("c.css"), fx.path("site.chirp.config")]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_removed_config_stops_tracking_members() {
    let fx = site_project();
    assert!(fx.pipeline.dependencies().has_dependents(&fx.path("a.css")));

    fx.pipeline.on_file_removed(&fx.path("site.chirp.config"));

    assert!(fx.pipeline.dependencies().is_empty());
    assert!(fx.pipeline.pending().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_syntax_errors_publish_diagnostics_and_skip_output() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/bad.chirp.js", "function (");
    let fx = PipelineFixture::from_settings(fs, "/p", &SettingsBuilder::new().build());
    let mut events = fx.pipeline.diagnostics().subscribe();

    fx.pipeline.on_file_changed(&fx.path("bad.chirp.js"));
    with_timeout(fx.drain()).await;

    assert!(fx.pipeline.diagnostics().has_errors(&fx.path("bad.chirp.js")));
    assert!(!fx.fs.is_file(&fx.path("bad.min.js")));

    let mut reported = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let DiagnosticEvent::Reported(d) = event {
            reported.push(d);
        }
    }
    assert!(!reported.is_empty());
    assert!(reported.iter().all(|d| d.file == fx.path("bad.chirp.js")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconfigure_drops_newly_ignored_pending_files() {
    let fx = site_project();
    fx.fs.add_file("/p/vendor/x.css", "x { color: red }");
    fx.pipeline.on_file_changed(&fx.path("vendor/x.css"));
    fx.pipeline.on_file_changed(&fx.path("a.css"));

    let settings = SettingsBuilder::new().ignore("vendor/**").build();
    let engines = cascade::engine::EngineSet::from_settings(&settings, fx.pipeline.context());
    fx.pipeline.reconfigure(engines);

    assert_eq!(fx.pipeline.pending(), vec![fx.path("a.css")]);
    assert_eq!(
        fx.pipeline.enqueue(&fx.path("vendor/x.css")),
        EnqueueOutcome::Filtered(FilterReason::Ignored)
    );
    // The dependency map outlives the engine set.
    assert!(fx.pipeline.dependencies().has_dependents(&fx.path("a.css")));
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    with_timeout(async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_long_running_worker_reloads_and_shuts_down() {
    let fx = site_project();
    let (tx, rx) = mpsc::channel(8);
    let handle = PipelineHandle::new(Arc::clone(&fx.pipeline), tx);
    let worker = tokio::spawn(
        Worker::new(Arc::clone(&fx.pipeline), rx, WorkerOptions::default()).run(),
    );

    handle.on_file_changed(&fx.path("a.css"));
    let site_css = fx.path("site.css");
    wait_until(|| fx.fs.write_count(&site_css) == 1 && fx.pipeline.is_idle()).await;

    let settings = SettingsBuilder::new().lint(false).build();
    handle.reload(&settings).await.unwrap();
    wait_until(|| !fx.pipeline.engines().names().contains(&"lint-css")).await;

    handle.shutdown().await.unwrap();
    let summary = with_timeout(worker).await.unwrap().unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.cascaded, 1);
}

#[test]
fn test_paths_resolve_against_fixture_root() {
    let fx = PipelineFixture::from_settings(
        MockFileSystem::new(),
        "/p",
        &SettingsBuilder::new().build(),
    );
    assert_eq!(fx.path("a/b.css"), PathBuf::from("/p/a/b.css"));
}
