// src/diagnostics/mod.rs

//! Per-file diagnostic bookkeeping.
//!
//! The sink answers "does this file currently have unresolved errors" for
//! the engine chain, and publishes every change as a [`DiagnosticEvent`]
//! for whatever surfaces diagnostics to the user.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::engine::ErrorResult;
use crate::fs::PathKey;
use crate::types::Severity;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// File the diagnostic points into.
    pub file: PathBuf,
    /// File whose engine chain reported it. Differs from `file` when a
    /// config reports a problem in one of its members.
    pub origin: PathBuf,
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn from_result(origin: &Path, result: ErrorResult) -> Self {
        Self {
            file: result.source_file,
            origin: origin.to_path_buf(),
            message: result.message,
            line: result.line,
            column: result.column,
            severity: result.severity,
        }
    }

    pub fn error(file: &Path, message: impl Into<String>) -> Self {
        Self {
            file: file.to_path_buf(),
            origin: file.to_path_buf(),
            message: message.into(),
            line: 0,
            column: 0,
            severity: Severity::Error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}:{}:{}: {}",
            self.severity,
            self.file.display(),
            self.line,
            self.column,
            self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    Reported(Diagnostic),
    /// Every diagnostic on `file` was withdrawn. Any still standing are
    /// re-sent as `Reported` right after.
    Cleared { file: PathBuf },
}

#[derive(Debug)]
pub struct DiagnosticsSink {
    open: Mutex<HashMap<PathKey, Vec<Diagnostic>>>,
    events: broadcast::Sender<DiagnosticEvent>,
}

impl Default for DiagnosticsSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsSink {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            open: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DiagnosticEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: DiagnosticEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        debug!(%diagnostic, "diagnostic reported");
        self.open
            .lock()
            .entry(PathKey::new(&diagnostic.file))
            .or_default()
            .push(diagnostic.clone());
        self.publish(DiagnosticEvent::Reported(diagnostic));
    }

    /// Withdraw every diagnostic on `file` and every diagnostic `file`'s
    /// chain reported on other files.
    pub fn clear(&self, file: &Path) {
        let key = PathKey::new(file);
        let mut events = Vec::new();
        {
            let mut open = self.open.lock();
            if let Some(removed) = open.remove(&key) {
                if !removed.is_empty() {
                    events.push(DiagnosticEvent::Cleared {
                        file: file.to_path_buf(),
                    });
                }
            }

            for list in open.values_mut() {
                let mut withdrawn = None;
                list.retain(|d| {
                    if PathKey::new(&d.origin) == key {
                        withdrawn.get_or_insert_with(|| d.file.clone());
                        false
                    } else {
                        true
                    }
                });
                if let Some(other) = withdrawn {
                    events.push(DiagnosticEvent::Cleared { file: other });
                    events.extend(list.iter().cloned().map(DiagnosticEvent::Reported));
                }
            }
            open.retain(|_, list| !list.is_empty());
        }
        for event in events {
            self.publish(event);
        }
    }

    /// Does `file` have an open error-severity diagnostic?
    pub fn has_errors(&self, file: &Path) -> bool {
        self.open
            .lock()
            .get(&PathKey::new(file))
            .map(|list| list.iter().any(|d| d.severity == Severity::Error))
            .unwrap_or(false)
    }

    pub fn diagnostics_for(&self, file: &Path) -> Vec<Diagnostic> {
        self.open
            .lock()
            .get(&PathKey::new(file))
            .cloned()
            .unwrap_or_default()
    }

    /// All open diagnostics, ordered by file.
    pub fn all(&self) -> Vec<Diagnostic> {
        let open = self.open.lock();
        let mut keys: Vec<&PathKey> = open.keys().collect();
        keys.sort();
        keys.into_iter()
            .flat_map(|k| open[k].iter().cloned())
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.open
            .lock()
            .values()
            .flat_map(|list| list.iter())
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}
