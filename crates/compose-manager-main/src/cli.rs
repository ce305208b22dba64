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

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "compose-manager", version)]
#[command(about = "Discover, inspect and update Docker Compose projects")]
#[command(
    long_about = "Discover, inspect and update Docker Compose projects.\n\
    \nProjects are read from the cache when it is fresh, otherwise the directory is scanned.\n\
    \nExamples:\n  \
    compose-manager                                  # Overview with cached versions\n  \
    compose-manager /srv/docker --list               # List projects and status\n  \
    compose-manager --update-cache                   # Refresh image versions (cron)\n  \
    compose-manager --update web db --recreate       # Pull and recreate two projects\n  \
    compose-manager /srv/docker --update web,db      # DIRECTORY goes before --update"
)]
#[command(group(
    ArgGroup::new("mode")
        .args(["list", "update_cache", "update", "start", "stop", "restart"])
        .multiple(false)
))]
pub struct Cli {
    /// Directory to scan for compose projects (overrides the config file)
    pub directory: Option<PathBuf>,

    /// List all projects and their status
    #[arg(short, long)]
    pub list: bool,

    /// Check every project for image updates and rewrite the cache
    #[arg(long)]
    pub update_cache: bool,

    /// Pull new images for the named projects, in parallel.
    /// Takes every following value, so DIRECTORY must come first.
    #[arg(long, value_name = "NAME", num_args = 1.., value_delimiter = ',')]
    pub update: Vec<String>,

    /// Recreate containers after pulling
    #[arg(long, requires = "update")]
    pub recreate: bool,

    /// Recreate only these projects; the rest of the batch is just pulled
    #[arg(long, value_name = "NAME", num_args = 1.., value_delimiter = ',', requires = "recreate")]
    pub recreate_only: Vec<String>,

    /// Start a project (`up -d`)
    #[arg(long, value_name = "NAME")]
    pub start: Option<String>,

    /// Stop a project (`down`)
    #[arg(long, value_name = "NAME")]
    pub stop: Option<String>,

    /// Restart a project's containers
    #[arg(long, value_name = "NAME")]
    pub restart: Option<String>,

    /// Configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Start,
    Stop,
    Restart,
}

impl Lifecycle {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Restart => "restarted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Overview,
    List,
    UpdateCache,
    Update {
        names: Vec<String>,
        recreate: bool,
        recreate_only: Vec<String>,
    },
    Lifecycle(Lifecycle, String),
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.list {
            return Mode::List;
        }
        if self.update_cache {
            return Mode::UpdateCache;
        }
        if !self.update.is_empty() {
            return Mode::Update {
                names: self.update.clone(),
                recreate: self.recreate,
                recreate_only: self.recreate_only.clone(),
            };
        }
        let lifecycle = [
            (Lifecycle::Start, &self.start),
            (Lifecycle::Stop, &self.stop),
            (Lifecycle::Restart, &self.restart),
        ];
        for (action, name) in lifecycle {
            if let Some(name) = name {
                return Mode::Lifecycle(action, name.clone());
            }
        }
        Mode::Overview
    }
}
