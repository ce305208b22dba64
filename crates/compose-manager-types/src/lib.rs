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

pub mod image;
pub mod project;
pub mod update;

// Re-export common types for convenience
pub use image::{ImageInfo, NOT_PULLED, TIMEOUT};
pub use project::{Project, ProjectStatus, StatusParseError};
pub use update::{ProjectUpdate, UpdateMode, UpdatePlan, UpdateState};
