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

//! Locate compose projects under a search root

use crate::client::ComposeClient;
use crate::error::{ComposeError, Result};
use compose_manager_types::Project;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File names recognized as compose definitions
pub const COMPOSE_FILE_NAMES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

pub fn is_compose_file(name: &str) -> bool {
    COMPOSE_FILE_NAMES.contains(&name) && !name.contains("control")
}

/// Compose files under `root`, at most `max_depth` levels down, in path order.
///
/// Unreadable entries below the root are skipped; an unreadable root is an error.
pub fn find_compose_files(root: &Path, max_depth: usize) -> Result<Vec<PathBuf>> {
    std::fs::read_dir(root).map_err(|source| ComposeError::Discovery {
        path: root.to_path_buf(),
        source,
    })?;

    let files = WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_type().is_dir())
        .filter(|entry| entry.file_name().to_str().is_some_and(is_compose_file))
        .map(walkdir::DirEntry::into_path)
        .collect();

    Ok(files)
}

fn project_name(dir: &Path) -> String {
    dir.file_name().map_or_else(
        || dir.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

impl ComposeClient {
    /// Find every compose project under `root` and read its running state.
    ///
    /// A directory holding several compose files yields one project, using
    /// the first file in name order.
    pub async fn discover(&self, root: &Path, max_depth: usize) -> Result<Vec<Project>> {
        let walk_root = root.to_path_buf();
        let files = tokio::task::spawn_blocking(move || find_compose_files(&walk_root, max_depth))
            .await
            .map_err(|err| ComposeError::Io(std::io::Error::other(err)))??;

        let mut seen = HashSet::new();
        let mut projects = Vec::new();
        for file in files {
            let Some(dir) = file.parent() else {
                continue;
            };
            if !seen.insert(dir.to_path_buf()) {
                debug!(file = %file.display(), "Skipping additional compose file");
                continue;
            }

            let mut project = Project::new(project_name(dir), dir, &file);
            match self.refresh_status(&mut project).await {
                Ok(()) => projects.push(project),
                Err(err) => warn!(project = %project.name, error = %err, "Skipping project"),
            }
        }

        if projects.is_empty() {
            return Err(ComposeError::NoProjects(root.to_path_buf()));
        }

        info!(count = projects.len(), root = %root.display(), "Discovered compose projects");
        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "services: {}\n").unwrap();
    }

    #[test]
    fn test_recognized_names() {
        assert!(is_compose_file("compose.yaml"));
        assert!(is_compose_file("docker-compose.yml"));
        assert!(!is_compose_file("docker-compose.override.yml"));
        assert!(!is_compose_file("compose.json"));
    }

    #[test]
    fn test_depth_limit() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("a/compose.yml"));
        touch(&temp.path().join("a/b/c/compose.yml"));

        let shallow = find_compose_files(temp.path(), 2).unwrap();
        assert_eq!(shallow, vec![temp.path().join("a/compose.yml")]);

        let deep = find_compose_files(temp.path(), 4).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_control_directories_are_not_filtered_by_name() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("control-plane/compose.yml"));

        let files = find_compose_files(temp.path(), 3).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_missing_root() {
        let temp = tempfile::tempdir().unwrap();
        let err = find_compose_files(&temp.path().join("nope"), 3).unwrap_err();
        assert!(matches!(err, ComposeError::Discovery { .. }));
    }

    #[test]
    fn test_project_name_is_directory_name() {
        assert_eq!(project_name(Path::new("/srv/docker/gitea")), "gitea");
    }
}
