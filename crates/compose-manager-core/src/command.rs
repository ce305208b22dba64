// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Compose Manager.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! External command execution and the modern/legacy compose fallback

use crate::error::ComposeError;
use crate::sanitize::summarize_output;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Program used for runtime queries and the modern `docker compose` plugin
pub const DOCKER: &str = "docker";

/// Standalone v1 client, tried when the plugin invocation fails
pub const LEGACY_COMPOSE: &str = "docker-compose";

// ============= Command Description =============

/// A single external process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_owned(),
            args: args.into_iter().map(Into::into).collect(),
            dir: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.dir = Some(dir.to_path_buf());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and arguments joined by spaces, for logs and test matching
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Captured result of a process that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: &str) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.to_owned(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: &str) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_owned(),
        }
    }

    /// Stdout followed by stderr
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
            (false, true) => self.stdout.clone(),
            _ => self.stderr.clone(),
        }
    }

    /// Non-empty, trimmed stdout lines
    pub fn stdout_lines(&self) -> Vec<&str> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} timed out after {}s", .after.as_secs())]
    TimedOut { command: String, after: Duration },
}

// ============= Runner Seam =============

/// Executes external commands. Non-zero exits are reported through
/// `CommandOutput::success`, not as errors.
#[async_trait]
pub trait CommandRunner: Send + Sync + fmt::Debug {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError> {
        let mut command = tokio::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &spec.dir {
            command.current_dir(dir);
        }

        debug!(command = %spec, dir = ?spec.dir, "Running command");

        let pending = command.output();
        let result = match spec.timeout {
            Some(after) => tokio::time::timeout(after, pending)
                .await
                .map_err(|_| RunError::TimedOut {
                    command: spec.command_line(),
                    after,
                })?,
            None => pending.await,
        };

        let output = result.map_err(|source| RunError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ============= Compose Fallback =============

/// One compose subcommand, runnable through either client generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeCommand {
    pub args: Vec<String>,
    pub dir: PathBuf,
    pub timeout: Option<Duration>,
}

impl ComposeCommand {
    pub fn new(dir: &Path, args: &[&str]) -> Self {
        Self {
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            dir: dir.to_path_buf(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `docker compose <args>`
    pub fn modern(&self) -> CommandSpec {
        CommandSpec::new(DOCKER, std::iter::once("compose".to_owned()).chain(self.args.iter().cloned()))
            .in_dir(&self.dir)
            .with_timeout(self.timeout)
    }

    /// `docker-compose <args>`
    pub fn legacy(&self) -> CommandSpec {
        CommandSpec::new(LEGACY_COMPOSE, self.args.iter().cloned())
            .in_dir(&self.dir)
            .with_timeout(self.timeout)
    }
}

/// Outcome of a compose command after both clients were given a chance
#[derive(Debug)]
pub enum FallbackError {
    /// The last attempted client ran and exited non-zero
    Failed(CommandOutput),
    /// The last attempted client could not run or timed out
    Run(RunError),
}

impl FallbackError {
    /// Convert into an engine error with a single sanitized message line
    pub fn into_compose_error(self, operation: &str) -> ComposeError {
        match self {
            Self::Failed(output) => tool_error(operation, &output),
            Self::Run(RunError::TimedOut { after, .. }) => ComposeError::Timeout {
                operation: operation.to_owned(),
                after,
            },
            Self::Run(err @ RunError::Spawn { .. }) => ComposeError::Tool {
                operation: operation.to_owned(),
                message: err.to_string(),
            },
        }
    }
}

/// Build a `ComposeError::Tool` from noisy command output
pub fn tool_error(operation: &str, output: &CommandOutput) -> ComposeError {
    let message = summarize_output(&output.combined()).unwrap_or_else(|| match output.code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_owned(),
    });
    ComposeError::Tool {
        operation: operation.to_owned(),
        message,
    }
}

/// Run `docker compose <args>`, retrying with `docker-compose <args>` when the
/// modern client cannot run or exits non-zero.
///
/// A timeout of the modern client is returned as-is.
pub async fn run_with_fallback(
    runner: &dyn CommandRunner,
    command: &ComposeCommand,
) -> Result<CommandOutput, FallbackError> {
    let modern = command.modern();
    match runner.run(&modern).await {
        Ok(output) if output.success => return Ok(output),
        Ok(output) => {
            debug!(command = %modern, code = ?output.code, "Modern compose failed, trying legacy client");
        }
        Err(err @ RunError::TimedOut { .. }) => return Err(FallbackError::Run(err)),
        Err(err) => {
            debug!(command = %modern, error = %err, "Modern compose unavailable, trying legacy client");
        }
    }

    let legacy = command.legacy();
    match runner.run(&legacy).await {
        Ok(output) if output.success => Ok(output),
        Ok(output) => Err(FallbackError::Failed(output)),
        Err(err) => Err(FallbackError::Run(err)),
    }
}
