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
use std::collections::HashSet;
use std::fmt;

/// How selected projects are updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Pull new images, leave running containers alone
    #[default]
    PullOnly,
    /// Pull, then recreate the containers of projects selected for restart
    Recreate,
}

/// Which projects a parallel update batch touches.
///
/// Projects are identified by their index in the project collection. Both sets
/// are unordered; `recreate` only matters in `UpdateMode::Recreate` and is
/// expected to be a subset of `selected`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    pub mode: UpdateMode,
    pub selected: HashSet<usize>,
    pub recreate: HashSet<usize>,
}

impl UpdatePlan {
    pub fn pull_only(selected: impl IntoIterator<Item = usize>) -> Self {
        Self {
            mode: UpdateMode::PullOnly,
            selected: selected.into_iter().collect(),
            recreate: HashSet::new(),
        }
    }

    /// Recreate every selected project
    pub fn recreate_all(selected: impl IntoIterator<Item = usize>) -> Self {
        let selected: HashSet<usize> = selected.into_iter().collect();
        Self {
            mode: UpdateMode::Recreate,
            recreate: selected.clone(),
            selected,
        }
    }

    pub fn toggle(&mut self, index: usize) {
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        } else {
            self.recreate.remove(&index);
        }
    }

    pub fn toggle_recreate(&mut self, index: usize) {
        if !self.recreate.remove(&index) && self.selected.contains(&index) {
            self.recreate.insert(index);
        }
    }

    /// Whether the project at `index` should be recreated after its pull
    pub fn should_recreate(&self, index: usize) -> bool {
        self.mode == UpdateMode::Recreate && self.recreate.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Progress of one project inside a parallel update batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    Pending,
    Updating,
    Success,
    Failed,
}

impl UpdateState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Updating => write!(f, "updating"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// State plus the short result message shown once the project finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    pub name: String,
    pub state: UpdateState,
    pub message: Option<String>,
}

impl ProjectUpdate {
    pub fn pending(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            state: UpdateState::Pending,
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recreate_only_in_recreate_mode() {
        let mut plan = UpdatePlan::pull_only([0, 1]);
        plan.toggle_recreate(1);
        assert!(!plan.should_recreate(1));

        plan.mode = UpdateMode::Recreate;
        assert!(plan.should_recreate(1));
        assert!(!plan.should_recreate(0));
    }

    #[test]
    fn test_recreate_requires_selection() {
        let mut plan = UpdatePlan::pull_only([0]);
        plan.toggle_recreate(5);
        assert!(plan.recreate.is_empty());
    }

    #[test]
    fn test_deselect_drops_recreate() {
        let mut plan = UpdatePlan::recreate_all([2, 3]);
        plan.toggle(2);
        assert_eq!(plan.len(), 1);
        assert!(!plan.recreate.contains(&2));

        plan.toggle(2);
        assert!(plan.selected.contains(&2));
        assert!(!plan.should_recreate(2));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!UpdateState::Pending.is_terminal());
        assert!(!UpdateState::Updating.is_terminal());
        assert!(UpdateState::Success.is_terminal());
        assert!(UpdateState::Failed.is_terminal());
    }
}
