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

//! Plain-text presentation of projects, update results and sweep progress

use chrono::{DateTime, Local, TimeZone};
use compose_manager_core::{ComposeError, SweepStep};
use compose_manager_types::{ImageInfo, Project, ProjectUpdate, UpdateState};
use std::fmt::Display;

pub fn status_label(project: &Project) -> String {
    if project.is_running() {
        format!("Running ({})", project.running_containers())
    } else {
        "Stopped".to_owned()
    }
}

/// Numbered entry for `--list`
pub fn list_entry(position: usize, project: &Project) -> String {
    format!(
        "{position:2}. {:<20}  {}\n    Path: {}",
        project.name,
        status_label(project),
        project.path.display()
    )
}

/// Oldest `last_updated` of the collection in local time
pub fn cache_age(projects: &[Project]) -> String {
    cache_age_in(projects, &Local)
}

pub fn cache_age_in<Tz>(projects: &[Project], zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    projects
        .iter()
        .map(|project| project.last_updated)
        .min()
        .filter(|oldest| oldest.timestamp() > 0)
        .map_or_else(
            || "unknown".to_owned(),
            |oldest| format_time(&oldest.with_timezone(zone)),
        )
}

fn format_time<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format("%Y-%m-%d %H:%M").to_string()
}

/// Result cell of a parallel update
pub fn update_result(update: &ProjectUpdate) -> String {
    match update.state {
        UpdateState::Success => "✓ OK".to_owned(),
        UpdateState::Failed => format!("✗ {}", update.message.as_deref().unwrap_or("failed")),
        UpdateState::Pending => "pending".to_owned(),
        UpdateState::Updating => "updating...".to_owned(),
    }
}

pub fn update_line(update: &ProjectUpdate) -> String {
    format!("{:<30}  {}", update.name, update_result(update))
}

/// `[i/n] name  outcome` line printed during a version sweep
pub fn sweep_line(step: &SweepStep, total: usize) -> String {
    format!(
        "[{}/{}] {:<20} {}",
        step.index + 1,
        total,
        step.name,
        sweep_outcome(&step.outcome)
    )
}

fn sweep_outcome(outcome: &Result<usize, ComposeError>) -> String {
    match outcome {
        Ok(0) => "✓ up to date".to_owned(),
        Ok(count) => format!("✓ {count} update(s) available"),
        Err(err) => format!("❌ error: {err}"),
    }
}

/// One image row: marker, image, tag, local version, latest version
pub fn image_line(info: &ImageInfo) -> String {
    let marker = if info.has_update { "⬆" } else { "✓" };
    let short = info.name.rsplit('/').next().unwrap_or(&info.name);
    let (image, tag) = short.split_once(':').unwrap_or((short, "latest"));
    format!(
        "  {marker:<2} {image:<20}  {tag:<12}  {:<15}  {}",
        info.current_version, info.latest_version
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use compose_manager_types::NOT_PULLED;

    fn project(name: &str) -> Project {
        Project::new(name, format!("/srv/{name}"), format!("/srv/{name}/compose.yaml"))
    }

    #[test]
    fn test_status_label() {
        let mut web = project("web");
        assert_eq!(status_label(&web), "Stopped");
        web.set_running_count(3);
        assert_eq!(status_label(&web), "Running (3)");
    }

    #[test]
    fn test_list_entry() {
        let entry = list_entry(2, &project("gitea"));
        assert_eq!(
            entry,
            " 2. gitea                 Stopped\n    Path: /srv/gitea"
        );
    }

    #[test]
    fn test_cache_age_uses_oldest_record() {
        let mut old = project("old");
        old.last_updated = Utc.with_ymd_and_hms(2025, 3, 1, 8, 5, 0).unwrap();
        let mut new = project("new");
        new.last_updated = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();

        assert_eq!(cache_age_in(&[new, old], &Utc), "2025-03-01 08:05");
        assert_eq!(cache_age_in(&[], &Utc), "unknown");
    }

    #[test]
    fn test_update_result() {
        let mut update = ProjectUpdate::pending("web");
        update.state = UpdateState::Success;
        assert_eq!(update_result(&update), "✓ OK");

        update.state = UpdateState::Failed;
        update.message = Some("pull timed out after 120s".to_owned());
        assert_eq!(update_result(&update), "✗ pull timed out after 120s");
    }

    #[test]
    fn test_sweep_line() {
        let step = SweepStep {
            index: 0,
            name: "web".to_owned(),
            outcome: Ok(2),
        };
        assert_eq!(
            sweep_line(&step, 5),
            "[1/5] web                  ✓ 2 update(s) available"
        );

        let failed = SweepStep {
            index: 4,
            name: "db".to_owned(),
            outcome: Err(ComposeError::Tool {
                operation: "list images".to_owned(),
                message: "no such service".to_owned(),
            }),
        };
        assert!(sweep_line(&failed, 5).ends_with("❌ error: list images failed: no such service"));
    }

    #[test]
    fn test_image_line() {
        let info = ImageInfo::not_pulled("ghcr.io/org/app:1.4", "1.4");
        let line = image_line(&info);
        assert!(line.starts_with("  ⬆  app"));
        assert!(line.contains("1.4"));
        assert!(line.ends_with(NOT_PULLED));
    }
}
