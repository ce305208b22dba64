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

//! Compose Manager - command-line driver for the compose project engine

mod cli;
mod format;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Lifecycle, Mode};
use compose_manager_core::{
    CacheStore, ComposeClient, ManagerConfig, VersionSweep, load_or_discover, run_parallel_updates,
};
use compose_manager_types::{Project, UpdateMode, UpdatePlan};
use std::collections::HashSet;
use tracing::{info, warn};

const DEFAULT_LOG_FILTER: &str = "compose_manager=info,compose_manager_core=info";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    let mut config =
        ManagerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(directory) = &cli.directory {
        config.search_dir.clone_from(directory);
    }
    if !config.search_dir.exists() {
        bail!("directory does not exist: {}", config.search_dir.display());
    }

    let store = config
        .cache_store()
        .context("Failed to resolve cache location")?;
    let client = ComposeClient::system(config.timeouts());

    let mut projects = load_or_discover(&client, &config, &store)
        .await
        .with_context(|| format!("Failed to load projects from {}", config.search_dir.display()))?;

    match cli.mode() {
        Mode::List => print_list(&projects),
        Mode::UpdateCache => update_cache(&client, &mut projects, &store).await,
        Mode::Update {
            names,
            recreate,
            recreate_only,
        } => update(&client, &mut projects, &store, &names, recreate, &recreate_only).await?,
        Mode::Lifecycle(action, name) => {
            lifecycle(&client, &mut projects, &store, action, &name).await?;
        }
        Mode::Overview => overview(&client, &mut projects).await,
    }

    Ok(())
}

fn print_list(projects: &[Project]) {
    println!("\nDocker Compose Projects:");
    println!("========================");
    for (i, project) in projects.iter().enumerate() {
        println!("{}", format::list_entry(i + 1, project));
    }
    println!("\nTotal: {} projects", projects.len());
}

/// Cron mode: check every project, saving after each one
async fn update_cache(client: &ComposeClient, projects: &mut [Project], store: &CacheStore) {
    println!("Checking for updates...");
    println!("Cache location: {}", store.path().display());
    println!("Found {} projects\n", projects.len());

    let mut sweep = VersionSweep::new(client, projects);
    let total = sweep.total();
    while let Some(step) = sweep.next_step().await {
        println!("{}", format::sweep_line(&step, total));
        save_cache(store, sweep.projects());
    }

    info!(path = %store.path().display(), "Cache updated");
    println!("\n✓ Cache updated successfully: {}", store.path().display());
}

fn project_indices(projects: &[Project], names: &[String]) -> Result<HashSet<usize>> {
    names
        .iter()
        .map(|name| {
            projects
                .iter()
                .position(|project| &project.name == name)
                .with_context(|| format!("unknown project: {name}"))
        })
        .collect()
}

async fn update(
    client: &ComposeClient,
    projects: &mut [Project],
    store: &CacheStore,
    names: &[String],
    recreate: bool,
    recreate_only: &[String],
) -> Result<()> {
    let selected = project_indices(projects, names)?;
    let plan = if !recreate {
        UpdatePlan::pull_only(selected)
    } else if recreate_only.is_empty() {
        UpdatePlan::recreate_all(selected)
    } else {
        let mut plan = UpdatePlan::pull_only(selected);
        plan.mode = UpdateMode::Recreate;
        for index in project_indices(projects, recreate_only)? {
            if !plan.selected.contains(&index) {
                bail!("{} is not part of the update batch", projects[index].name);
            }
            plan.toggle_recreate(index);
        }
        plan
    };

    println!("Updating {} project(s) in parallel...\n", plan.len());
    let progress = run_parallel_updates(client, projects, &plan, |index, progress| {
        if let Some(update) = progress.get(index) {
            println!(
                "[{}/{}] {}",
                progress.completed,
                progress.total,
                format::update_line(update)
            );
        }
    })
    .await;

    save_cache(store, projects);

    if progress.failed() > 0 {
        bail!("{} of {} project(s) failed to update", progress.failed(), progress.total);
    }
    Ok(())
}

async fn lifecycle(
    client: &ComposeClient,
    projects: &mut [Project],
    store: &CacheStore,
    action: Lifecycle,
    name: &str,
) -> Result<()> {
    let project = projects
        .iter_mut()
        .find(|project| project.name == name)
        .with_context(|| format!("unknown project: {name}"))?;

    let result = match action {
        Lifecycle::Start => client.start(project).await,
        Lifecycle::Stop => client.stop(project).await,
        Lifecycle::Restart => client.restart(project).await,
    };
    result.with_context(|| format!("Failed to {} {name}", action.verb()))?;
    println!("✓ Successfully {} {name}", action.past_tense());

    save_cache(store, projects);
    Ok(())
}

/// Projects with their known image versions and the cache age
async fn overview(client: &ComposeClient, projects: &mut [Project]) {
    println!("Cache updated: {}\n", format::cache_age(projects));

    for (i, project) in projects.iter_mut().enumerate() {
        if project.image_info().is_empty() && project.is_running() {
            if let Err(err) = client.running_image_info(project).await {
                warn!(project = %project.name, error = %err, "Could not read running images");
            }
        }

        let updates = if project.has_updates() {
            format!("  ⬆ {} update(s)", project.update_count())
        } else {
            String::new()
        };
        println!(
            "[{}] {:<20} {}{updates}",
            i + 1,
            project.name,
            format::status_label(project)
        );
        for info in project.image_info().values() {
            println!("{}", format::image_line(info));
        }
    }
}

fn save_cache(store: &CacheStore, projects: &[Project]) {
    if let Err(err) = store.save(projects) {
        warn!(path = %store.path().display(), error = %err, "Failed to save cache");
    }
}
