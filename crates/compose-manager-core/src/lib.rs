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

//! Discovery, status, version resolution, updates, and caching of Docker
//! Compose projects

pub mod cache;
pub mod client;
pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod sanitize;
pub mod status;
pub mod version;

pub use cache::CacheStore;
pub use client::{ComposeClient, Timeouts};
pub use command::{
    CommandOutput, CommandRunner, CommandSpec, ComposeCommand, FallbackError, RunError,
    SystemRunner, run_with_fallback,
};
pub use config::ManagerConfig;
pub use error::{CacheError, ComposeError, Result};
pub use orchestrator::{BatchProgress, SweepStep, VersionSweep, check_all, run_parallel_updates};

use compose_manager_types::Project;
use tracing::{info, warn};

/// Projects from a fresh cache, or from a new discovery that is then cached.
///
/// Any cache miss triggers discovery; failing to write the new cache is only
/// logged.
pub async fn load_or_discover(
    client: &ComposeClient,
    config: &ManagerConfig,
    store: &CacheStore,
) -> Result<Vec<Project>> {
    match store.load() {
        Ok(projects) => {
            info!(projects = projects.len(), path = %store.path().display(), "Loaded projects from cache");
            return Ok(projects);
        }
        Err(err) => info!(reason = %err, "Cache unavailable, scanning for projects"),
    }

    let projects = client.discover(&config.search_dir, config.max_depth).await?;
    if let Err(err) = store.save(&projects) {
        warn!(path = %store.path().display(), error = %err, "Failed to save cache");
    }
    Ok(projects)
}
