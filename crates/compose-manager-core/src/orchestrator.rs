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

//! Parallel update batches and the sequential version-check sweep

use crate::cache::CacheStore;
use crate::client::ComposeClient;
use crate::error::Result;
use compose_manager_types::{Project, ProjectUpdate, UpdatePlan, UpdateState};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{info, warn};

// ============= Parallel Updates =============

/// Per-project state of a running batch, keyed by project index
#[derive(Debug, Clone, Default)]
pub struct BatchProgress {
    pub updates: BTreeMap<usize, ProjectUpdate>,
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    fn new(indices: &[usize], projects: &[Project]) -> Self {
        let updates = indices
            .iter()
            .map(|&index| (index, ProjectUpdate::pending(&projects[index].name)))
            .collect();
        Self {
            updates,
            completed: 0,
            total: indices.len(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    pub fn succeeded(&self) -> usize {
        self.count(UpdateState::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(UpdateState::Failed)
    }

    pub fn get(&self, index: usize) -> Option<&ProjectUpdate> {
        self.updates.get(&index)
    }

    fn count(&self, state: UpdateState) -> usize {
        self.updates.values().filter(|update| update.state == state).count()
    }

    fn set_state(&mut self, index: usize, state: UpdateState) {
        if let Some(update) = self.updates.get_mut(&index) {
            update.state = state;
        }
    }

    /// Record a terminal outcome; returns false if the project already finished
    fn finish(&mut self, index: usize, state: UpdateState, message: Option<String>) -> bool {
        match self.updates.get_mut(&index) {
            Some(update) if !update.state.is_terminal() => {
                update.state = state;
                update.message = message;
                self.completed += 1;
                true
            }
            _ => false,
        }
    }
}

/// Sent by an update task when its project is done
#[derive(Debug)]
struct Completion {
    index: usize,
    project: Project,
    outcome: Result<()>,
}

/// Update every selected project concurrently.
///
/// Each task works on its own copy of the project; the copy replaces the
/// entry in `projects` when the task reports success. `on_progress` runs once
/// per finished project, in completion order. Returns when every selected
/// project has reached `Success` or `Failed`.
pub async fn run_parallel_updates<F>(
    client: &ComposeClient,
    projects: &mut [Project],
    plan: &UpdatePlan,
    mut on_progress: F,
) -> BatchProgress
where
    F: FnMut(usize, &BatchProgress),
{
    let mut indices: Vec<usize> = plan
        .selected
        .iter()
        .copied()
        .filter(|&index| index < projects.len())
        .collect();
    indices.sort_unstable();

    let mut progress = BatchProgress::new(&indices, projects);
    if indices.is_empty() {
        return progress;
    }

    info!(projects = indices.len(), mode = ?plan.mode, "Starting update batch");

    let (sender, mut receiver) = mpsc::unbounded_channel();
    for &index in &indices {
        let recreate = plan.should_recreate(index);
        let mut project = projects[index].clone();
        let client = client.clone();
        let sender = sender.clone();

        progress.set_state(index, UpdateState::Updating);
        tokio::spawn(async move {
            let outcome = if recreate {
                client.pull_and_recreate(&mut project).await
            } else {
                client.pull_only(&mut project).await
            };
            // A closed receiver means nobody is waiting for this batch anymore
            let _ = sender.send(Completion {
                index,
                project,
                outcome,
            });
        });
    }
    drop(sender);

    while let Some(done) = receiver.recv().await {
        let Completion {
            index,
            project,
            outcome,
        } = done;

        let recorded = match outcome {
            Ok(()) => {
                projects[index] = project;
                progress.finish(index, UpdateState::Success, None)
            }
            Err(err) => {
                warn!(project = %project.name, error = %err, "Project update failed");
                progress.finish(index, UpdateState::Failed, Some(err.to_string()))
            }
        };
        if recorded {
            on_progress(index, &progress);
        }
        if progress.is_complete() {
            break;
        }
    }

    // Tasks that died without reporting
    for &index in &indices {
        if progress.finish(index, UpdateState::Failed, Some("update task aborted".to_owned())) {
            on_progress(index, &progress);
        }
    }

    info!(
        succeeded = progress.succeeded(),
        failed = progress.failed(),
        "Update batch finished"
    );
    progress
}

// ============= Version Sweep =============

/// Result of checking one project during a sweep
#[derive(Debug)]
pub struct SweepStep {
    pub index: usize,
    pub name: String,
    /// Number of images with an available update
    pub outcome: Result<usize>,
}

/// Checks image versions of one project at a time, in collection order.
///
/// Each `next_step` call finishes its project before returning, so the next
/// project never starts early.
#[derive(Debug)]
pub struct VersionSweep<'a> {
    client: &'a ComposeClient,
    projects: &'a mut [Project],
    next: usize,
}

impl<'a> VersionSweep<'a> {
    pub fn new(client: &'a ComposeClient, projects: &'a mut [Project]) -> Self {
        Self {
            client,
            projects,
            next: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.projects.len()
    }

    /// Number of projects already checked
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.projects.len()
    }

    pub fn projects(&self) -> &[Project] {
        self.projects
    }

    pub async fn next_step(&mut self) -> Option<SweepStep> {
        let index = self.next;
        let project = self.projects.get_mut(index)?;
        self.next += 1;

        let outcome = self
            .client
            .update_image_info(project)
            .await
            .map(|()| project.update_count());
        if let Err(err) = &outcome {
            warn!(project = %project.name, error = %err, "Version check failed");
        }

        Some(SweepStep {
            index,
            name: project.name.clone(),
            outcome,
        })
    }
}

/// Check every project, then save the collection once.
///
/// A failed save is logged and does not affect the returned steps.
pub async fn check_all(
    client: &ComposeClient,
    projects: &mut [Project],
    store: &CacheStore,
) -> Vec<SweepStep> {
    let mut sweep = VersionSweep::new(client, projects);
    let mut steps = Vec::with_capacity(sweep.total());
    while let Some(step) = sweep.next_step().await {
        steps.push(step);
    }

    if let Err(err) = store.save(sweep.projects()) {
        warn!(path = %store.path().display(), error = %err, "Failed to save cache after version check");
    }
    steps
}
