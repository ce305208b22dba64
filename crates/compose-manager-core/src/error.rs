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

//! Error types for the compose engine

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to search for projects in {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no docker-compose projects found in {0}")]
    NoProjects(PathBuf),

    /// A compose or docker command failed; `message` is a single sanitized line
    #[error("{operation} failed: {message}")]
    Tool { operation: String, message: String },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComposeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Reasons a cache file cannot be used. Every variant is a cache miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache file not found: {0}")]
    Missing(PathBuf),

    #[error("cache expired ({}s old, max {}s)", .age.as_secs(), .max_age.as_secs())]
    Expired { age: Duration, max_age: Duration },

    #[error("failed to access cache: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed cache: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("cache directory unavailable: {0}")]
    Location(String),
}

pub type Result<T> = std::result::Result<T, ComposeError>;
