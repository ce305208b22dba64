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

use crate::image::ImageInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

// ============= Project Status =============

/// Running state of a compose project.
///
/// On the wire this is `stopped` or `running:<count>`. A running status always
/// carries a non-zero count; `running:0` reads back as `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProjectStatus {
    #[default]
    Stopped,
    Running(u32),
}

impl ProjectStatus {
    pub fn from_count(count: u32) -> Self {
        if count == 0 {
            Self::Stopped
        } else {
            Self::Running(count)
        }
    }

    pub fn running_count(self) -> u32 {
        match self {
            Self::Stopped => 0,
            Self::Running(count) => count,
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, Self::Running(_))
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Running(count) => write!(f, "running:{count}"),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid project status '{0}', expected 'stopped' or 'running:<count>'")]
pub struct StatusParseError(String);

impl FromStr for ProjectStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "stopped" {
            return Ok(Self::Stopped);
        }
        s.strip_prefix("running:")
            .and_then(|count| count.parse::<u32>().ok())
            .map(Self::from_count)
            .ok_or_else(|| StatusParseError(s.to_owned()))
    }
}

impl TryFrom<String> for ProjectStatus {
    type Error = StatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProjectStatus> for String {
    fn from(status: ProjectStatus) -> Self {
        status.to_string()
    }
}

// ============= Project =============

/// One compose-managed application found on the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Name of the directory holding the compose file
    pub name: String,

    /// Project directory; compose commands run here
    pub path: PathBuf,

    /// Path to the compose definition file
    pub compose_file: PathBuf,

    status: ProjectStatus,

    running_containers: u32,

    /// Image references in compose-file order
    #[serde(default)]
    pub images: Vec<String>,

    /// Version info keyed by image reference
    #[serde(default)]
    image_info: BTreeMap<String, ImageInfo>,

    #[serde(default)]
    has_updates: bool,

    /// When this record was last refreshed or updated
    pub last_updated: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, compose_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            compose_file: compose_file.into(),
            status: ProjectStatus::Stopped,
            running_containers: 0,
            images: Vec::new(),
            image_info: BTreeMap::new(),
            has_updates: false,
            last_updated: Utc::now(),
        }
    }

    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    pub fn running_containers(&self) -> u32 {
        self.running_containers
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Set the running container count; the status tag follows it
    pub fn set_running_count(&mut self, count: u32) {
        self.status = ProjectStatus::from_count(count);
        self.running_containers = count;
    }

    pub fn mark_stopped(&mut self) {
        self.set_running_count(0);
    }

    pub fn image_info(&self) -> &BTreeMap<String, ImageInfo> {
        &self.image_info
    }

    pub fn has_updates(&self) -> bool {
        self.has_updates
    }

    /// Number of images with an available update
    pub fn update_count(&self) -> usize {
        self.image_info.values().filter(|info| info.has_update).count()
    }

    /// Replace the image list, dropping version info for images no longer used
    pub fn set_images(&mut self, images: Vec<String>) {
        self.images = images;
        let images = &self.images;
        self.image_info.retain(|name, _| images.contains(name));
        self.recompute_updates();
    }

    /// Record version info for an image, adding it to the image list if needed
    pub fn set_image_info(&mut self, info: ImageInfo) {
        if !self.images.contains(&info.name) {
            self.images.push(info.name.clone());
        }
        self.image_info.insert(info.name.clone(), info);
        self.recompute_updates();
    }

    /// After a successful pull and recreate every image is current
    pub fn mark_up_to_date(&mut self) {
        for info in self.image_info.values_mut() {
            info.mark_current();
        }
        self.has_updates = false;
        self.last_updated = Utc::now();
    }

    /// Re-derive fields that must agree after loading a record from disk
    pub fn normalize(&mut self) {
        self.running_containers = self.status.running_count();
        let images = &self.images;
        self.image_info.retain(|name, _| images.contains(name));
        self.recompute_updates();
    }

    fn recompute_updates(&mut self) {
        self.has_updates = self.image_info.values().any(|info| info.has_update);
    }
}
