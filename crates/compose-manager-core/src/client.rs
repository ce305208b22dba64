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

use crate::command::{
    CommandOutput, CommandRunner, CommandSpec, ComposeCommand, DOCKER, FallbackError, RunError,
    SystemRunner, run_with_fallback,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Limits for commands that talk to a registry or start containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// `docker run --rm <image> --version`
    pub probe: Duration,
    /// Registry pulls, both image checks and project pulls
    pub pull: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(5),
            pull: Duration::from_secs(120),
        }
    }
}

/// Entry point for every external tool invocation.
///
/// Cheap to clone; parallel update tasks each hold their own copy.
#[derive(Debug, Clone)]
pub struct ComposeClient {
    runner: Arc<dyn CommandRunner>,
    timeouts: Timeouts,
}

impl ComposeClient {
    pub fn new(runner: Arc<dyn CommandRunner>, timeouts: Timeouts) -> Self {
        Self { runner, timeouts }
    }

    /// Client backed by real child processes
    pub fn system(timeouts: Timeouts) -> Self {
        Self::new(Arc::new(SystemRunner), timeouts)
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Run a compose subcommand in `dir` with the modern/legacy fallback
    pub(crate) async fn compose(
        &self,
        dir: &Path,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, FallbackError> {
        let mut command = ComposeCommand::new(dir, args);
        if let Some(timeout) = timeout {
            command = command.with_timeout(timeout);
        }
        run_with_fallback(self.runner.as_ref(), &command).await
    }

    /// Run a plain `docker` command
    pub(crate) async fn docker(
        &self,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, RunError> {
        let spec = CommandSpec::new(DOCKER, args.iter().copied()).with_timeout(timeout);
        self.runner.run(&spec).await
    }
}
