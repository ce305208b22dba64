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

#![allow(dead_code)]

use async_trait::async_trait;
use compose_manager_core::{
    CommandOutput, CommandRunner, CommandSpec, ComposeClient, RunError, Timeouts,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// What a scripted command does when invoked
#[derive(Debug, Clone)]
pub enum Reply {
    Output(CommandOutput),
    TimedOut,
    NotInstalled,
    /// Kill the calling task
    Panic,
}

impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Self::Output(CommandOutput::ok(stdout))
    }

    pub fn fail(stderr: &str) -> Self {
        Self::Output(CommandOutput::failed(1, stderr))
    }
}

#[derive(Debug)]
struct Rule {
    dir: Option<PathBuf>,
    command: String,
    /// Consumed front to back; the last reply repeats
    replies: VecDeque<Reply>,
    delay: Option<Duration>,
}

impl Rule {
    fn next_reply(&mut self) -> Reply {
        if self.replies.len() > 1 {
            if let Some(reply) = self.replies.pop_front() {
                return reply;
            }
        }
        self.replies.front().cloned().unwrap_or(Reply::NotInstalled)
    }
}

/// Command runner answering from a fixed script and recording every call.
///
/// Rules match the full command line exactly. Rules bound to a directory are
/// tried before unbound ones; unmatched commands behave as if the program is
/// not installed.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, command: &str, reply: Reply) -> &Self {
        self.push(None, command, vec![reply], None)
    }

    /// Successive calls get successive replies
    pub fn on_each(&self, command: &str, replies: Vec<Reply>) -> &Self {
        self.push(None, command, replies, None)
    }

    pub fn on_in(&self, dir: &Path, command: &str, reply: Reply) -> &Self {
        self.push(Some(dir), command, vec![reply], None)
    }

    pub fn on_in_after(&self, dir: &Path, command: &str, reply: Reply, delay: Duration) -> &Self {
        self.push(Some(dir), command, vec![reply], Some(delay))
    }

    fn push(
        &self,
        dir: Option<&Path>,
        command: &str,
        replies: Vec<Reply>,
        delay: Option<Duration>,
    ) -> &Self {
        self.rules.lock().push(Rule {
            dir: dir.map(Path::to_path_buf),
            command: command.to_owned(),
            replies: replies.into(),
            delay,
        });
        self
    }

    /// Every command line run so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(CommandSpec::command_line).collect()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls.lock().iter().filter(|spec| spec.command_line() == command).count()
    }

    /// Timeout attached to the first recorded call of `command`
    pub fn timeout_of(&self, command: &str) -> Option<Duration> {
        self.calls
            .lock()
            .iter()
            .find(|spec| spec.command_line() == command)
            .and_then(|spec| spec.timeout)
    }

    fn lookup(&self, spec: &CommandSpec) -> (Reply, Option<Duration>) {
        let line = spec.command_line();
        let mut rules = self.rules.lock();
        let position = rules
            .iter()
            .position(|rule| rule.dir.is_some() && rule.dir == spec.dir && rule.command == line)
            .or_else(|| {
                rules
                    .iter()
                    .position(|rule| rule.dir.is_none() && rule.command == line)
            });
        match position {
            Some(index) => {
                let rule = &mut rules[index];
                (rule.next_reply(), rule.delay)
            }
            None => (Reply::NotInstalled, None),
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError> {
        self.calls.lock().push(spec.clone());
        let (reply, delay) = self.lookup(spec);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Reply::Output(output) => Ok(output),
            Reply::TimedOut => Err(RunError::TimedOut {
                command: spec.command_line(),
                after: spec.timeout.unwrap_or_default(),
            }),
            Reply::Panic => panic!("scripted panic for {}", spec.command_line()),
            Reply::NotInstalled => Err(RunError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            }),
        }
    }
}

pub fn client(runner: &Arc<ScriptedRunner>) -> ComposeClient {
    ComposeClient::new(runner.clone(), Timeouts::default())
}

/// Create `<root>/<name>/<file>` and return the project directory
pub fn compose_project(root: &Path, name: &str, file: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file), "services:\n  app:\n    image: nginx:latest\n").unwrap();
    dir
}

/// Script a project whose `ps` queries report `running` services
pub fn script_running(runner: &ScriptedRunner, dir: &Path, running: &[&str]) {
    let ids: Vec<String> = (0..running.len()).map(|i| format!("c0ffee{i}")).collect();
    runner.on_in(dir, "docker compose ps --quiet", Reply::ok(&ids.join("\n")));
    runner.on_in(
        dir,
        "docker compose ps --services --filter status=running",
        Reply::ok(&running.join("\n")),
    );
}
