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

//! Manager settings and cache file placement

use crate::cache::CacheStore;
use crate::client::Timeouts;
use crate::error::{CacheError, ComposeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Directory name used under the system and per-user cache/config roots
pub const APP_DIR: &str = "compose-manager";

const CONFIG_FILE_NAME: &str = "config.toml";
const CACHE_FILE_NAME: &str = "cache.json";
const SYSTEM_CACHE_DIR: &str = "/var/cache/compose-manager";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Root searched for compose projects
    #[serde(default = "default_search_dir")]
    pub search_dir: PathBuf,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,

    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_pull_timeout_secs")]
    pub pull_timeout_secs: u64,

    /// Explicit cache file; resolved automatically when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<PathBuf>,
}

fn default_search_dir() -> PathBuf {
    PathBuf::from("/home/dockeruser/docker")
}

fn default_max_depth() -> usize {
    10
}

fn default_cache_max_age_secs() -> u64 {
    3600
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_pull_timeout_secs() -> u64 {
    120
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            search_dir: default_search_dir(),
            max_depth: default_max_depth(),
            cache_max_age_secs: default_cache_max_age_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            pull_timeout_secs: default_pull_timeout_secs(),
            cache_file: None,
        }
    }
}

impl ManagerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            ComposeError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        let config: Self = toml::from_str(&content).map_err(|err| {
            ComposeError::Config(format!("failed to parse {}: {err}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path if given, else the per-user config file if present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "Using config file");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(ComposeError::Config("max_depth must be at least 1".to_owned()));
        }
        if self.cache_max_age_secs == 0 {
            return Err(ComposeError::Config(
                "cache_max_age_secs must be greater than 0".to_owned(),
            ));
        }
        if self.probe_timeout_secs == 0 || self.pull_timeout_secs == 0 {
            return Err(ComposeError::Config("timeouts must be greater than 0".to_owned()));
        }
        Ok(())
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            probe: Duration::from_secs(self.probe_timeout_secs),
            pull: Duration::from_secs(self.pull_timeout_secs),
        }
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    /// Cache store at the configured or first writable default location
    pub fn cache_store(&self) -> Result<CacheStore> {
        let path = match &self.cache_file {
            Some(path) => path.clone(),
            None => resolve_cache_file()?,
        };
        Ok(CacheStore::new(path, self.cache_max_age()))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// System cache directory when writable, else the per-user cache directory
pub fn resolve_cache_file() -> Result<PathBuf> {
    let mut candidates = vec![PathBuf::from(SYSTEM_CACHE_DIR)];
    if let Some(dir) = dirs::cache_dir() {
        candidates.push(dir.join(APP_DIR));
    } else if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".cache").join(APP_DIR));
    }

    let dir = first_writable_dir(&candidates).ok_or_else(|| {
        CacheError::Location(format!(
            "none of {} is writable",
            candidates
                .iter()
                .map(|dir| dir.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })?;
    Ok(dir.join(CACHE_FILE_NAME))
}

/// First directory that can be created and written to
fn first_writable_dir(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|dir| is_writable(dir)).cloned()
}

fn is_writable(dir: &Path) -> bool {
    if let Err(err) = fs::create_dir_all(dir) {
        debug!(dir = %dir.display(), error = %err, "Cache directory unavailable");
        return false;
    }
    let probe = dir.join(".write-test");
    match fs::write(&probe, b"") {
        Ok(()) => {
            if let Err(err) = fs::remove_file(&probe) {
                warn!(path = %probe.display(), error = %err, "Failed to remove write probe");
            }
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.search_dir, PathBuf::from("/home/dockeruser/docker"));
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.cache_max_age(), Duration::from_secs(3600));
        assert_eq!(config.timeouts(), Timeouts::default());
        assert!(config.cache_file.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "search_dir = \"/opt/stacks\"\npull_timeout_secs = 30\n").unwrap();

        let config = ManagerConfig::from_file(&path).unwrap();
        assert_eq!(config.search_dir, PathBuf::from("/opt/stacks"));
        assert_eq!(config.timeouts().pull, Duration::from_secs(30));
        assert_eq!(config.max_depth, 10);
    }

    #[test]
    fn test_zero_values_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_depth = 0\n").unwrap();
        assert!(matches!(
            ManagerConfig::from_file(&path),
            Err(ComposeError::Config(_))
        ));

        let config = ManagerConfig {
            probe_timeout_secs: 0,
            ..ManagerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = tempfile::tempdir().unwrap();
        let result = ManagerConfig::load(Some(&temp.path().join("missing.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_cache_file_wins() {
        let config = ManagerConfig {
            cache_file: Some(PathBuf::from("/tmp/custom/cache.json")),
            ..ManagerConfig::default()
        };
        let store = config.cache_store().unwrap();
        assert_eq!(store.path(), Path::new("/tmp/custom/cache.json"));
    }

    #[test]
    fn test_first_writable_dir_skips_unusable() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let usable = temp.path().join("cache/compose-manager");
        let found = first_writable_dir(&[blocker.join("sub"), usable.clone()]);
        assert_eq!(found, Some(usable.clone()));
        assert!(!usable.join(".write-test").exists());
    }
}
