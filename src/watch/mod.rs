// src/watch/mod.rs

//! File watching.
//!
//! Wires a cross-platform filesystem watcher (`notify`) to the pipeline:
//! OS events become [`crate::events::FileEvent`]s, and a change to the
//! settings file reloads the engine set.

pub mod classify;
pub mod watcher;

pub use classify::classify_event;
pub use watcher::{WatcherHandle, spawn_watcher};
