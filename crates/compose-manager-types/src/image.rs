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

use serde::{Deserialize, Serialize};

/// Latest-version sentinel for an image that has no local copy yet
pub const NOT_PULLED: &str = "not pulled";

/// Latest-version sentinel for an image whose registry pull timed out
pub const TIMEOUT: &str = "timeout";

/// Version information for a single image reference of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Full image reference, e.g. `postgres:15` or `ghcr.io/org/app:latest`
    pub name: String,

    /// Human-meaningful version of the local image
    pub current_version: String,

    /// Latest known version, or one of the `NOT_PULLED` / `TIMEOUT` sentinels
    pub latest_version: String,

    /// Whether a newer image is available (or the image was never pulled)
    pub has_update: bool,
}

impl ImageInfo {
    /// Image whose running version is known but was not compared against the registry
    pub fn unchecked(name: &str, version: &str) -> Self {
        Self {
            name: name.to_owned(),
            current_version: version.to_owned(),
            latest_version: version.to_owned(),
            has_update: false,
        }
    }

    /// Image without a local copy; always counts as an available update
    pub fn not_pulled(name: &str, current_version: &str) -> Self {
        Self {
            name: name.to_owned(),
            current_version: current_version.to_owned(),
            latest_version: NOT_PULLED.to_owned(),
            has_update: true,
        }
    }

    /// Image whose registry check timed out; not treated as an update
    pub fn timed_out(name: &str, current_version: &str) -> Self {
        Self {
            name: name.to_owned(),
            current_version: current_version.to_owned(),
            latest_version: TIMEOUT.to_owned(),
            has_update: false,
        }
    }

    pub fn is_not_pulled(&self) -> bool {
        self.latest_version == NOT_PULLED
    }

    pub fn is_timed_out(&self) -> bool {
        self.latest_version == TIMEOUT
    }

    /// Treat the newest known image as the one now running
    pub fn mark_current(&mut self) {
        self.has_update = false;
        if self.is_not_pulled() || self.is_timed_out() || self.latest_version.ends_with(" (newer)") {
            self.latest_version.clone_from(&self.current_version);
        } else {
            self.current_version.clone_from(&self.latest_version);
        }
    }
}
