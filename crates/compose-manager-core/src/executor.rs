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

//! Lifecycle and update operations on a single project

use crate::client::ComposeClient;
use crate::command::{RunError, tool_error};
use crate::error::{ComposeError, Result};
use crate::sanitize::summarize_output;
use crate::version::image_tag;
use chrono::Utc;
use compose_manager_types::{ImageInfo, Project};
use tracing::{debug, info, warn};

impl ComposeClient {
    /// `up -d`, then re-read the status
    pub async fn start(&self, project: &mut Project) -> Result<()> {
        self.compose(&project.path, &["up", "-d"], None)
            .await
            .map_err(|err| err.into_compose_error("start"))?;
        info!(project = %project.name, "Project started");
        self.refresh_status(project).await
    }

    /// `down`; the project is stopped afterwards by definition
    pub async fn stop(&self, project: &mut Project) -> Result<()> {
        self.compose(&project.path, &["down"], None)
            .await
            .map_err(|err| err.into_compose_error("stop"))?;
        project.mark_stopped();
        info!(project = %project.name, "Project stopped");
        Ok(())
    }

    pub async fn restart(&self, project: &mut Project) -> Result<()> {
        self.compose(&project.path, &["restart"], None)
            .await
            .map_err(|err| err.into_compose_error("restart"))?;
        info!(project = %project.name, "Project restarted");
        self.refresh_status(project).await
    }

    /// Image references declared by the compose file, stored on the project
    pub async fn list_images(&self, project: &mut Project) -> Result<Vec<String>> {
        let output = self
            .compose(&project.path, &["config", "--images"], None)
            .await
            .map_err(|err| err.into_compose_error("list images"))?;

        let images: Vec<String> = output.stdout_lines().into_iter().map(str::to_owned).collect();
        project.set_images(images.clone());
        Ok(images)
    }

    /// Pull new images without touching running containers
    pub async fn pull_only(&self, project: &mut Project) -> Result<()> {
        self.pull(project).await?;
        info!(project = %project.name, "Images pulled");
        self.refresh_status(project).await
    }

    /// Pull, clean up orphans, then recreate every container
    pub async fn pull_and_recreate(&self, project: &mut Project) -> Result<()> {
        self.pull(project).await?;

        // Stale orphans make the legacy client fail recreation with
        // `KeyError: 'ContainerConfig'`
        if let Err(err) = self
            .compose(&project.path, &["down", "--remove-orphans"], None)
            .await
        {
            debug!(project = %project.name, error = ?err, "Orphan cleanup failed, continuing");
        }

        self.compose(
            &project.path,
            &["up", "-d", "--force-recreate", "--remove-orphans"],
            None,
        )
        .await
        .map_err(|err| err.into_compose_error("recreate"))?;

        project.mark_up_to_date();
        info!(project = %project.name, "Project updated and recreated");
        self.refresh_status(project).await
    }

    async fn pull(&self, project: &Project) -> Result<()> {
        let limit = self.timeouts().pull;
        self.compose(&project.path, &["pull"], Some(limit))
            .await
            .map(drop)
            .map_err(|err| err.into_compose_error("pull"))
    }

    /// Compare every declared image against the registry.
    ///
    /// Per-image problems become data (`not pulled`, `timeout`), so this only
    /// fails when the image list itself cannot be read.
    pub async fn update_image_info(&self, project: &mut Project) -> Result<()> {
        let images = self.list_images(project).await?;
        for image in &images {
            let info = self.check_image(image).await;
            project.set_image_info(info);
        }
        project.last_updated = Utc::now();
        debug!(project = %project.name, updates = project.update_count(), "Image info refreshed");
        Ok(())
    }

    async fn check_image(&self, image: &str) -> ImageInfo {
        let tag = image_tag(image);
        let Some(current_id) = self.local_image_id(image).await else {
            return ImageInfo::not_pulled(image, tag);
        };

        // Must run before the pull moves a generic tag to the new image
        let current = self.resolve_version(image, tag).await;

        let limit = self.timeouts().pull;
        match self.docker(&["pull", "--quiet", image], Some(limit)).await {
            Ok(output) if output.success => {}
            Ok(output) => {
                let reason = summarize_output(&output.combined()).unwrap_or_default();
                debug!(image, %reason, "Registry pull failed, keeping local version");
                return ImageInfo::unchecked(image, &current);
            }
            Err(RunError::TimedOut { after, .. }) => {
                warn!(image, after_secs = after.as_secs(), "Registry pull timed out");
                return ImageInfo::timed_out(image, &current);
            }
            Err(err) => {
                debug!(image, error = %err, "Registry pull did not run");
                return ImageInfo::unchecked(image, &current);
            }
        }

        match self.local_image_id(image).await {
            Some(latest_id) if latest_id != current_id => {
                let mut latest = self.resolve_version(image, tag).await;
                if latest == current {
                    latest = format!("{tag} (newer)");
                }
                ImageInfo {
                    name: image.to_owned(),
                    current_version: current,
                    latest_version: latest,
                    has_update: true,
                }
            }
            _ => ImageInfo::unchecked(image, &current),
        }
    }

    async fn local_image_id(&self, image: &str) -> Option<String> {
        let output = self
            .docker(&["images", image, "--format", "{{.ID}}"], None)
            .await
            .ok()
            .filter(|output| output.success)?;
        output.stdout_lines().first().map(|id| (*id).to_owned())
    }

    /// Record versions of the images the project's containers run right now.
    ///
    /// No registry access; every recorded image is marked as current.
    pub async fn running_image_info(&self, project: &mut Project) -> Result<()> {
        let label = format!("label=com.docker.compose.project={}", project.name);
        let output = self
            .docker(&["ps", "--filter", label.as_str(), "--format", "{{.Image}}"], None)
            .await
            .map_err(|err| ComposeError::Tool {
                operation: "list containers".to_owned(),
                message: err.to_string(),
            })?;
        if !output.success {
            return Err(tool_error("list containers", &output));
        }

        for image in output.stdout_lines() {
            let version = self.resolve_version(image, image_tag(image)).await;
            project.set_image_info(ImageInfo::unchecked(image, &version));
        }
        Ok(())
    }
}
