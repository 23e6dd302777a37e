// src/exec/mod.rs

//! Shell execution for action engines.
//!
//! The template engine talks to a [`TemplateRunner`] instead of spawning
//! processes itself, so tests can substitute a recording fake while
//! production uses [`ShellTemplateRunner`].

use std::fmt::Debug;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::errors::Result;

pub mod runner;

pub use runner::ShellTemplateRunner;

/// Runs a regeneration command.
pub trait TemplateRunner: Send + Sync + Debug {
    /// Run `command` with `cwd` as working directory and resolve once it has
    /// exited. A non-zero exit is an error.
    fn run<'a>(
        &'a self,
        command: &'a str,
        cwd: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
