// src/exec/runner.rs

//! Shell process runner for template regeneration.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, anyhow};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use super::TemplateRunner;
use crate::errors::{CascadeError, Result};

/// Runs commands through the platform shell, streaming output to the log.
#[derive(Debug, Clone, Default)]
pub struct ShellTemplateRunner;

impl TemplateRunner for ShellTemplateRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
        cwd: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move { run_shell(command, cwd).await.map_err(CascadeError::from) })
    }
}

async fn run_shell(command: &str, cwd: &Path) -> anyhow::Result<()> {
    info!(cmd = %command, cwd = %cwd.display(), "running template command");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };

    cmd.current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning template command '{command}'"))?;

    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!("template: {}", line);
            }
        });
    }

    // Always consume stderr so buffers don't fill.
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("template stderr: {}", line);
            }
        });
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for template command '{command}'"))?;

    if !status.success() {
        return Err(anyhow!(
            "template command '{}' exited with code {}",
            command,
            status.code().unwrap_or(-1)
        ));
    }

    info!(cmd = %command, "template command finished");
    Ok(())
}
