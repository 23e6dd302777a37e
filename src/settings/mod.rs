// src/settings/mod.rs

//! Settings loading and validation.
//!
//! - TOML-backed data model (`model.rs`).
//! - Loading from disk (`loader.rs`).
//! - Validation into [`Settings`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{
    AggregateSection, CssSection, JsSection, LintSection, PipelineSection, RawSettings,
    Settings, StyleSection, TemplateSection,
};
