// src/queue/mod.rs

//! Work queue and its worker.
//!
//! The pure state machine lives in [`core`]; [`runtime`] is the async shell
//! that drains it, and [`handle`] is the producer-side API.

pub mod core;
pub mod handle;
pub mod runtime;

pub use self::core::{EnqueueOutcome, EntryState, FilterReason, QueueCore};
pub use handle::PipelineHandle;
pub use runtime::{ControlEvent, Worker, WorkerOptions, WorkerSummary};
