// tests/template_engine.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cascade::engine::{Engine, EngineKind, EngineSet, TemplateEngine};
use cascade::events::EditorEvents;
use cascade::fs::mock::MockFileSystem;
use cascade_test_utils::builders::{PipelineFixture, SettingsBuilder};
use cascade_test_utils::fakes::FakeTemplateRunner;
use cascade_test_utils::{init_tracing, with_timeout};
use globset::{Glob, GlobSet, GlobSetBuilder};

const DEBOUNCE: Duration = Duration::from_millis(40);

fn triggers(patterns: &[&str]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        builder.add(Glob::new(p).unwrap());
    }
    builder.build().unwrap()
}

fn engine(runner: &FakeTemplateRunner) -> TemplateEngine {
    TemplateEngine::new(
        triggers(&["templates/**/*.tpl"]),
        "/p",
        "make templates",
        DEBOUNCE,
        Arc::new(runner.clone()),
    )
}

async fn settle() {
    tokio::time::sleep(DEBOUNCE * 4).await;
}

#[test]
fn test_triggers_match_relative_to_root() {
    let engine = engine(&FakeTemplateRunner::new());
    assert_eq!(engine.kind(), EngineKind::Action);
    assert!(engine.classify(Path::new("/p/templates/mail/welcome.tpl")) > 0);
    assert_eq!(engine.classify(Path::new("/p/other/welcome.tpl")), 0);
    assert_eq!(engine.classify(Path::new("/elsewhere/templates/a.tpl")), 0);
}

#[test]
fn test_run_outside_a_runtime_is_an_error() {
    let engine = engine(&FakeTemplateRunner::new());
    assert!(engine.run(Path::new("/p/templates/a.tpl"), None).is_err());
}

#[tokio::test]
async fn test_burst_of_runs_fires_the_command_once() {
    init_tracing();
    let runner = FakeTemplateRunner::new();
    let engine = engine(&runner);

    for name in ["a.tpl", "b.tpl", "a.tpl"] {
        let results = engine
            .run(&Path::new("/p/templates").join(name), None)
            .unwrap();
        assert!(results.is_empty());
        tokio::time::sleep(DEBOUNCE / 4).await;
    }
    settle().await;

    assert_eq!(
        runner.runs(),
        vec![("make templates".to_string(), PathBuf::from("/p"))]
    );
}

#[tokio::test]
async fn test_quiet_period_between_runs_fires_twice() {
    let runner = FakeTemplateRunner::new();
    let engine = engine(&runner);
    let trigger = Path::new("/p/templates/a.tpl");

    engine.run(trigger, None).unwrap();
    settle().await;
    engine.run(trigger, None).unwrap();
    settle().await;

    assert_eq!(runner.run_count(), 2);
}

#[tokio::test]
async fn test_dispose_flushes_the_pending_run() {
    let runner = FakeTemplateRunner::new();
    let engine = engine(&runner);

    engine.run(Path::new("/p/templates/a.tpl"), None).unwrap();
    let tasks = engine.dispose();
    assert_eq!(tasks.len(), 1);
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(runner.run_count(), 1);

    // The aborted timer must not fire a second time.
    settle().await;
    assert_eq!(runner.run_count(), 1);
}

#[tokio::test]
async fn test_dispose_without_pending_work_returns_nothing() {
    let runner = FakeTemplateRunner::new();
    let engine = engine(&runner);

    assert!(engine.dispose().is_empty());
    settle().await;
    assert_eq!(runner.run_count(), 0);
}

#[tokio::test]
async fn test_dispose_hands_back_a_command_still_running() {
    let runner = FakeTemplateRunner::new().with_delay(DEBOUNCE * 3);
    let engine = engine(&runner);

    engine.run(Path::new("/p/templates/a.tpl"), None).unwrap();
    tokio::time::sleep(DEBOUNCE * 2).await;
    assert_eq!(runner.run_count(), 1);

    let tasks = engine.dispose();
    assert_eq!(tasks.len(), 1);
    for task in tasks {
        with_timeout(task).await.unwrap();
    }
    assert_eq!(runner.run_count(), 1);
}

#[tokio::test]
async fn test_started_command_survives_a_restart() {
    let runner = FakeTemplateRunner::new().with_delay(DEBOUNCE * 2);
    let engine = engine(&runner);
    let trigger = Path::new("/p/templates/a.tpl");

    engine.run(trigger, None).unwrap();
    // Let the first command start, then restart the timer while it runs.
    tokio::time::sleep(DEBOUNCE + DEBOUNCE / 2).await;
    engine.run(trigger, None).unwrap();
    tokio::time::sleep(DEBOUNCE * 5).await;

    assert_eq!(runner.run_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pipeline_runs_template_for_trigger_changes() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/page.tpl", "<h1>{{ title }}</h1>");
    let settings = SettingsBuilder::new()
        .template("make pages", &["*.tpl"], DEBOUNCE.as_millis() as u64)
        .build();
    let fx = PipelineFixture::from_settings(fs, "/p", &settings);
    assert!(fx.pipeline.engines().names().contains(&"template"));

    fx.pipeline.on_file_changed(&fx.path("page.tpl"));
    let summary = with_timeout(fx.drain()).await;
    assert_eq!(summary.processed, 1);
    settle().await;

    assert_eq!(fx.runner.run_count(), 1);
    assert_eq!(fx.runner.runs()[0].0, "make pages");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_one_shot_build_still_runs_the_debounced_command() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/p/views/index.tpl", "<main></main>");
    let settings = SettingsBuilder::new()
        .template("make views", &["views/**"], 50)
        .build();
    let fx = PipelineFixture::from_settings(fs, "/p", &settings);

    let queued = fx.pipeline.scan(&fx.root).unwrap();
    assert_eq!(queued, vec![fx.path("views/index.tpl")]);
    with_timeout(fx.drain()).await;

    // Shutting down straight after the queue empties, before the debounce
    // expires.
    for task in fx.pipeline.engines().dispose() {
        with_timeout(task).await.unwrap();
    }
    assert_eq!(fx.runner.run_count(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(fx.runner.runs(), vec![("make views".to_string(), PathBuf::from("/p"))]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconfigure_flushes_the_old_template_engine() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/page.tpl", "<h1></h1>");
    let settings = SettingsBuilder::new()
        .template("make pages", &["*.tpl"], 10_000)
        .build();
    let fx = PipelineFixture::from_settings(fs, "/p", &settings);

    fx.pipeline.on_file_changed(&fx.path("page.tpl"));
    with_timeout(fx.drain()).await;
    assert_eq!(fx.runner.run_count(), 0);

    let engines = EngineSet::from_settings(&SettingsBuilder::new().build(), fx.pipeline.context());
    fx.pipeline.reconfigure(engines);

    with_timeout(async {
        while fx.runner.run_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert_eq!(fx.runner.run_count(), 1);
}
