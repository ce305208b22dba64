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

//! JSON persistence of the project collection with an age-based freshness window

use crate::error::CacheError;
use compose_manager_types::Project;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Cache file location plus the maximum age at which it is still trusted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStore {
    path: PathBuf,
    max_age: Duration,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            path: path.into(),
            max_age,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Write the whole collection. Each save writes its own uniquely named temp
    /// file and renames it into place, so readers and concurrent writers never
    /// see a partial file.
    pub fn save(&self, projects: &[Project]) -> Result<(), CacheError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let content = serde_json::to_string_pretty(projects)?;
        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|err| err.error)?;

        debug!(path = %self.path.display(), projects = projects.len(), "Cache saved");
        Ok(())
    }

    /// Load the collection if the file is younger than the freshness window
    pub fn load(&self) -> Result<Vec<Project>, CacheError> {
        self.load_as_of(SystemTime::now())
    }

    /// `load` with an explicit clock reading
    pub fn load_as_of(&self, now: SystemTime) -> Result<Vec<Project>, CacheError> {
        let modified = match fs::metadata(&self.path) {
            Ok(metadata) => metadata.modified()?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(CacheError::Missing(self.path.clone()));
            }
            Err(err) => return Err(err.into()),
        };

        let age = cache_age(modified, now);
        if is_expired(age, self.max_age) {
            return Err(CacheError::Expired {
                age,
                max_age: self.max_age,
            });
        }

        let content = fs::read_to_string(&self.path)?;
        let mut projects: Vec<Project> = serde_json::from_str(&content)?;
        for project in &mut projects {
            project.normalize();
        }

        debug!(path = %self.path.display(), projects = projects.len(), age_secs = age.as_secs(), "Cache loaded");
        Ok(projects)
    }

    /// Time since the cache file was last written, if it exists
    pub fn age(&self) -> Option<Duration> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        Some(cache_age(modified, SystemTime::now()))
    }
}

/// Age of a file modified at `modified`; timestamps in the future count as zero
pub fn cache_age(modified: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(modified).unwrap_or(Duration::ZERO)
}

/// A cache exactly `max_age` old is already expired
pub fn is_expired(age: Duration, max_age: Duration) -> bool {
    age >= max_age
}
