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

mod common;

use common::{Reply, ScriptedRunner, client};
use compose_manager_core::{ComposeClient, Timeouts};
use std::time::Duration;

const PROBE: &str = "docker run --rm gitea/gitea:latest --version";
const INSPECT: &str = "docker image inspect gitea/gitea:latest --format {{json .Config.Labels}}";

#[tokio::test]
async fn test_pinned_tag_spawns_nothing() {
    let runner = ScriptedRunner::new();
    let client = client(&runner);

    for (image, tag) in [("postgres:15", "15"), ("app:v1.2.3", "v1.2.3"), ("x:Latest", "Latest")] {
        assert_eq!(client.resolve_version(image, tag).await, tag);
    }
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_generic_tag_uses_version_line() {
    let runner = ScriptedRunner::new();
    runner.on(PROBE, Reply::ok("Gitea version: 1.21.4 built with GNU Make 4.4.1\n"));

    let version = client(&runner).resolve_version("gitea/gitea:latest", "latest").await;
    assert_eq!(version, "1.21.4 built with GNU Make 4.4.1");
    assert_eq!(runner.call_count(INSPECT), 0);
}

#[tokio::test]
async fn test_generic_tag_uses_version_token() {
    let runner = ScriptedRunner::new();
    runner.on(PROBE, Reply::ok("gitea v1.22.0\n"));

    let version = client(&runner).resolve_version("gitea/gitea:latest", "latest").await;
    assert_eq!(version, "1.22.0");
}

#[tokio::test]
async fn test_probe_runs_with_probe_timeout() {
    let runner = ScriptedRunner::new();
    runner.on(PROBE, Reply::TimedOut);
    runner.on(
        INSPECT,
        Reply::ok(r#"{"org.opencontainers.image.version":"1.20.0"}"#),
    );

    let version = client(&runner).resolve_version("gitea/gitea:latest", "latest").await;
    assert_eq!(version, "1.20.0");
    assert_eq!(runner.calls(), vec![PROBE, INSPECT]);
    assert_eq!(runner.timeout_of(PROBE), Some(Duration::from_secs(5)));
}

#[tokio::test]
async fn test_probe_honours_configured_timeout() {
    let runner = ScriptedRunner::new();
    runner.on(PROBE, Reply::ok("gitea v1.22.0\n"));
    let timeouts = Timeouts {
        probe: Duration::from_secs(2),
        ..Timeouts::default()
    };

    let client = ComposeClient::new(runner.clone(), timeouts);
    assert_eq!(client.resolve_version("gitea/gitea:latest", "latest").await, "1.22.0");
    assert_eq!(runner.timeout_of(PROBE), Some(Duration::from_secs(2)));
}

#[tokio::test]
async fn test_label_equal_to_tag_falls_through() {
    let runner = ScriptedRunner::new();
    runner.on(PROBE, Reply::fail("exec: \"--version\": executable file not found"));
    runner.on(
        INSPECT,
        Reply::ok(r#"{"org.opencontainers.image.version":"latest","VERSION":"2024.03"}"#),
    );

    let version = client(&runner).resolve_version("gitea/gitea:latest", "latest").await;
    assert_eq!(version, "2024.03");
}

#[tokio::test]
async fn test_unresolvable_returns_tag() {
    let runner = ScriptedRunner::new();
    runner.on(PROBE, Reply::ok("usage: gitea [command]\n"));
    runner.on(INSPECT, Reply::ok("null\n"));

    let version = client(&runner).resolve_version("gitea/gitea:latest", "latest").await;
    assert_eq!(version, "latest");
}
