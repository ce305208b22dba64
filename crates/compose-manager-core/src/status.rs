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

use crate::client::ComposeClient;
use crate::command::FallbackError;
use crate::error::{ComposeError, Result};
use compose_manager_types::Project;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

impl ComposeClient {
    /// Refresh the running state of `project` from the container runtime.
    ///
    /// Query failures leave the project marked stopped; the runtime being
    /// unreachable is not distinguishable from nothing running. Only a
    /// missing project directory is an error.
    pub async fn refresh_status(&self, project: &mut Project) -> Result<()> {
        if !project.path.is_dir() {
            project.mark_stopped();
            return Err(ComposeError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("project directory {} does not exist", project.path.display()),
            )));
        }

        let count = self.running_count(&project.path).await;
        project.set_running_count(count);
        debug!(project = %project.name, status = %project.status(), "Status refreshed");
        Ok(())
    }

    /// Number of running services of the project in `dir`
    pub async fn running_count(&self, dir: &Path) -> u32 {
        let containers = match self.compose(dir, &["ps", "--quiet"], None).await {
            Ok(output) => output,
            Err(err) => {
                log_absorbed(dir, "ps", &err);
                return 0;
            }
        };
        if containers.stdout_lines().is_empty() {
            return 0;
        }

        let running = match self
            .compose(dir, &["ps", "--services", "--filter", "status=running"], None)
            .await
        {
            Ok(output) => output,
            Err(err) => {
                log_absorbed(dir, "ps --services", &err);
                return 0;
            }
        };
        u32::try_from(running.stdout_lines().len()).unwrap_or(u32::MAX)
    }
}

fn log_absorbed(dir: &Path, query: &str, err: &FallbackError) {
    let reason = match err {
        FallbackError::Failed(output) => crate::sanitize::summarize_output(&output.combined())
            .unwrap_or_else(|| "non-zero exit".to_owned()),
        FallbackError::Run(err) => err.to_string(),
    };
    warn!(dir = %dir.display(), query, %reason, "Status query failed, treating project as stopped");
}
