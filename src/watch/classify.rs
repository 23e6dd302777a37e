// src/watch/classify.rs

//! Translation of `notify` events into [`FileEvent`]s.

use std::path::Path;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

use crate::events::FileEvent;

/// Map one notify event to zero or more file events.
///
/// `exists` resolves renames the platform could not pair up: a bare
/// "renamed" path that still exists is a change, otherwise a removal.
pub fn classify_event(event: &Event, exists: impl Fn(&Path) -> bool) -> Vec<FileEvent> {
    let paths = &event.paths;
    match event.kind {
        EventKind::Create(_)
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Other) => {
            paths.iter().cloned().map(FileEvent::Changed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
            vec![FileEvent::Renamed {
                from: paths[0].clone(),
                to: paths[1].clone(),
            }]
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.iter().cloned().map(FileEvent::Removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.iter().cloned().map(FileEvent::Changed).collect()
        }
        EventKind::Modify(ModifyKind::Name(_)) => paths
            .iter()
            .cloned()
            .map(|p| {
                if exists(&p) {
                    FileEvent::Changed(p)
                } else {
                    FileEvent::Removed(p)
                }
            })
            .collect(),
        EventKind::Remove(_) => paths.iter().cloned().map(FileEvent::Removed).collect(),
        _ => Vec::new(),
    }
}
