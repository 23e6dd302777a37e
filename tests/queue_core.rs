// tests/queue_core.rs

use std::path::{Path, PathBuf};

use cascade::queue::{EnqueueOutcome, EntryState, QueueCore};

#[test]
fn test_pending_files_are_deduplicated_case_insensitively() {
    let mut q = QueueCore::new();
    assert_eq!(q.enqueue(Path::new("/p/Site.css")), EnqueueOutcome::Queued);
    assert_eq!(
        q.enqueue(Path::new("/P/site.CSS")),
        EnqueueOutcome::AlreadyPending
    );
    assert_eq!(q.pending_len(), 1);
    // The first spelling wins.
    assert_eq!(q.pending(), vec![PathBuf::from("/p/Site.css")]);
}

#[test]
fn test_files_run_in_enqueue_order() {
    let mut q = QueueCore::new();
    for name in ["/p/c.js", "/p/a.js", "/p/b.js"] {
        q.enqueue(Path::new(name));
    }
    q.enqueue(Path::new("/p/a.js"));

    let mut order = Vec::new();
    while let Some(path) = q.begin_next() {
        assert!(!q.complete(&path));
        order.push(path);
    }
    assert_eq!(
        order,
        vec![
            PathBuf::from("/p/c.js"),
            PathBuf::from("/p/a.js"),
            PathBuf::from("/p/b.js")
        ]
    );
    assert!(q.is_idle());
}

#[test]
fn test_enqueue_while_running_schedules_exactly_one_rerun() {
    let mut q = QueueCore::new();
    let p = Path::new("/p/site.chirp.config");
    q.enqueue(p);
    q.begin_next();
    assert_eq!(q.state_of(p), Some(EntryState::Running));

    assert_eq!(q.enqueue(p), EnqueueOutcome::Coalesced);
    assert_eq!(q.enqueue(p), EnqueueOutcome::AlreadyPending);
    assert_eq!(q.state_of(p), Some(EntryState::RunningRequeued));
    // Not runnable while its first run is in progress.
    assert_eq!(q.begin_next(), None);

    assert!(q.complete(p));
    assert_eq!(q.state_of(p), Some(EntryState::Pending));
    assert_eq!(q.begin_next().as_deref(), Some(p));
    assert!(!q.complete(p));
    assert_eq!(q.state_of(p), None);
}

#[test]
fn test_remove_only_touches_pending_work() {
    let mut q = QueueCore::new();
    let a = Path::new("/p/a.css");
    let b = Path::new("/p/b.css");
    q.enqueue(a);
    q.enqueue(b);

    assert!(q.remove(b));
    assert!(!q.remove(b));
    assert_eq!(q.pending(), vec![a.to_path_buf()]);

    // A running file keeps running; only its follow-up is cancelled.
    q.begin_next();
    assert!(!q.remove(a));
    q.enqueue(a);
    assert!(q.remove(a));
    assert_eq!(q.state_of(a), Some(EntryState::Running));
    assert!(!q.complete(a));
    assert!(q.is_idle());
}

#[test]
fn test_retain_pending_drops_and_reports() {
    let mut q = QueueCore::new();
    for name in ["/p/a.css", "/p/vendor/x.css", "/p/b.css"] {
        q.enqueue(Path::new(name));
    }
    let dropped = q.retain_pending(|p| !p.starts_with("/p/vendor"));
    assert_eq!(dropped, vec![PathBuf::from("/p/vendor/x.css")]);
    assert_eq!(q.pending_len(), 2);
    assert_eq!(q.state_of(Path::new("/p/vendor/x.css")), None);
}
