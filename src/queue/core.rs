// src/queue/core.rs

//! Pure queue state machine.
//!
//! Per file: `Pending → Running → (Done | Pending again)`. No IO, no
//! locking; [`crate::pipeline::Pipeline`] wraps it in a mutex and holds that
//! lock only for single operations.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use crate::fs::PathKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Running,
    /// Enqueued again while running; goes back to `Pending` on completion.
    RunningRequeued,
}

/// Why an enqueue request was turned away before reaching the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    Ignored,
    /// Generated output of a file that is itself transformed.
    DerivedOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    AlreadyPending,
    /// The file is being processed; it will run once more afterwards.
    Coalesced,
    Filtered(FilterReason),
}

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    state: EntryState,
}

/// Ordered, deduplicating work queue keyed by [`PathKey`].
///
/// `order` holds exactly the keys of `Pending` entries, in FIFO order.
#[derive(Debug, Default)]
pub struct QueueCore {
    order: VecDeque<PathKey>,
    entries: HashMap<PathKey, Entry>,
}

impl QueueCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, path: &Path) -> EnqueueOutcome {
        let key = PathKey::new(path);
        match self.entries.get_mut(&key) {
            None => {
                self.entries.insert(
                    key.clone(),
                    Entry {
                        path: path.to_path_buf(),
                        state: EntryState::Pending,
                    },
                );
                self.order.push_back(key);
                EnqueueOutcome::Queued
            }
            Some(entry) => match entry.state {
                EntryState::Pending | EntryState::RunningRequeued => EnqueueOutcome::AlreadyPending,
                EntryState::Running => {
                    entry.state = EntryState::RunningRequeued;
                    EnqueueOutcome::Coalesced
                }
            },
        }
    }

    /// Take the oldest pending entry and mark it running.
    pub fn begin_next(&mut self) -> Option<PathBuf> {
        let key = self.order.pop_front()?;
        let entry = self.entries.get_mut(&key)?;
        entry.state = EntryState::Running;
        Some(entry.path.clone())
    }

    /// Finish a run. Returns `true` if the file went back to pending.
    pub fn complete(&mut self, path: &Path) -> bool {
        let key = PathKey::new(path);
        match self.entries.get(&key).map(|e| e.state) {
            Some(EntryState::RunningRequeued) => {
                if let Some(entry) = self.entries.get_mut(&key) {
                    entry.state = EntryState::Pending;
                }
                self.order.push_back(key);
                true
            }
            Some(EntryState::Running) => {
                self.entries.remove(&key);
                false
            }
            Some(EntryState::Pending) | None => false,
        }
    }

    /// Forget a pending file, or cancel the follow-up run of a running one.
    /// A run in progress is never interrupted.
    pub fn remove(&mut self, path: &Path) -> bool {
        let key = PathKey::new(path);
        match self.entries.get(&key).map(|e| e.state) {
            Some(EntryState::Pending) => {
                self.entries.remove(&key);
                self.order.retain(|k| k != &key);
                true
            }
            Some(EntryState::RunningRequeued) => {
                if let Some(entry) = self.entries.get_mut(&key) {
                    entry.state = EntryState::Running;
                }
                true
            }
            Some(EntryState::Running) | None => false,
        }
    }

    /// Drop pending entries for which `keep` is false. Returns the dropped
    /// paths.
    pub fn retain_pending(&mut self, mut keep: impl FnMut(&Path) -> bool) -> Vec<PathBuf> {
        let mut dropped = Vec::new();
        let entries = &mut self.entries;
        self.order.retain(|key| {
            let Some(entry) = entries.get(key) else {
                return false;
            };
            if keep(&entry.path) {
                true
            } else {
                dropped.push(entry.path.clone());
                entries.remove(key);
                false
            }
        });
        dropped
    }

    pub fn state_of(&self, path: &Path) -> Option<EntryState> {
        self.entries.get(&PathKey::new(path)).map(|e| e.state)
    }

    pub fn pending_len(&self) -> usize {
        self.order.len()
    }

    /// Pending paths in the order they will run.
    pub fn pending(&self) -> Vec<PathBuf> {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(k).map(|e| e.path.clone()))
            .collect()
    }

    /// Nothing pending and nothing running.
    pub fn is_idle(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requeue_during_run_runs_again_once() {
        let mut q = QueueCore::new();
        let p = Path::new("/p/a.css");
        assert_eq!(q.enqueue(p), EnqueueOutcome::Queued);
        assert_eq!(q.begin_next().as_deref(), Some(p));
        assert_eq!(q.enqueue(p), EnqueueOutcome::Coalesced);
        assert_eq!(q.enqueue(p), EnqueueOutcome::AlreadyPending);
        assert_eq!(q.begin_next(), None);
        assert!(q.complete(p));
        assert_eq!(q.begin_next().as_deref(), Some(p));
        assert!(!q.complete(p));
        assert!(q.is_idle());
    }
}
