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

//! Turn image references into human-meaningful version strings

use crate::client::ComposeClient;
use std::collections::HashMap;
use tracing::debug;

/// Tags that say nothing about the version actually running
pub const GENERIC_TAGS: [&str; 5] = ["latest", "stable", "edge", "main", "master"];

const OCI_VERSION_LABEL: &str = "org.opencontainers.image.version";
const VERSION_LABELS: [&str; 2] = ["version", "VERSION"];

/// Only the head of `--version` output is considered
const PROBE_LINES: usize = 3;

pub fn is_generic_tag(tag: &str) -> bool {
    GENERIC_TAGS.contains(&tag)
}

/// Tag part of an image reference, `latest` when absent.
///
/// A colon only separates a tag when it follows the last `/`, so registry
/// ports (`registry:5000/app`) are not mistaken for tags. Digests are ignored.
pub fn image_tag(reference: &str) -> &str {
    let name = reference.split('@').next().unwrap_or(reference);
    let repo_start = name.rfind('/').map_or(0, |slash| slash + 1);
    match name[repo_start..].rfind(':') {
        Some(colon) => {
            let tag = &name[repo_start + colon + 1..];
            if tag.is_empty() { "latest" } else { tag }
        }
        None => "latest",
    }
}

/// Extract a version from the first lines of `<image> --version` output.
///
/// A `version:` line yields everything after its colon. Otherwise the first
/// whitespace-separated field that starts with a digit and contains a dot is
/// used, with a leading `v`/`V` stripped.
pub fn parse_probe_output(output: &str) -> Option<String> {
    for line in output.trim().lines().take(PROBE_LINES) {
        let line = line.trim();

        if line.to_lowercase().contains("version:") {
            if let Some((_, rest)) = line.split_once(':') {
                let version = rest.trim();
                if !version.is_empty() {
                    return Some(version.to_owned());
                }
            }
        }

        for field in line.split_whitespace() {
            let field = field
                .strip_prefix('v')
                .or_else(|| field.strip_prefix('V'))
                .unwrap_or(field);
            if field.contains('.') && field.starts_with(|c: char| c.is_ascii_digit()) {
                return Some(field.to_owned());
            }
        }
    }
    None
}

/// Version from image labels. The OCI label must differ from the tag to be
/// informative; the plain `version`/`VERSION` labels only need to be non-empty.
pub fn version_from_labels(labels: &HashMap<String, String>, tag: &str) -> Option<String> {
    if let Some(version) = labels.get(OCI_VERSION_LABEL) {
        if !version.is_empty() && version != tag {
            return Some(version.clone());
        }
    }
    VERSION_LABELS
        .iter()
        .filter_map(|key| labels.get(*key))
        .find(|version| !version.is_empty())
        .cloned()
}

impl ComposeClient {
    /// Best-effort version of a local image.
    ///
    /// Specific tags are returned unchanged without running anything. Generic
    /// tags are resolved by probing the image, then by its labels, then fall
    /// back to the tag itself. Never fails.
    pub async fn resolve_version(&self, image: &str, tag: &str) -> String {
        if !is_generic_tag(tag) {
            return tag.to_owned();
        }
        if let Some(version) = self.probe_version(image).await {
            debug!(image, version = %version, "Version from --version probe");
            return version;
        }
        if let Some(version) = self.label_version(image, tag).await {
            debug!(image, version = %version, "Version from image labels");
            return version;
        }
        tag.to_owned()
    }

    async fn probe_version(&self, image: &str) -> Option<String> {
        let probe = self.timeouts().probe;
        match self
            .docker(&["run", "--rm", image, "--version"], Some(probe))
            .await
        {
            Ok(output) if output.success => parse_probe_output(&output.stdout),
            Ok(_) => None,
            Err(err) => {
                debug!(image, error = %err, "Version probe did not run");
                None
            }
        }
    }

    async fn label_version(&self, image: &str, tag: &str) -> Option<String> {
        let output = self
            .docker(
                &["image", "inspect", image, "--format", "{{json .Config.Labels}}"],
                None,
            )
            .await
            .ok()
            .filter(|output| output.success)?;

        // Images without labels report `null`
        let labels: Option<HashMap<String, String>> =
            serde_json::from_str(output.stdout.trim()).ok()?;
        version_from_labels(&labels?, tag)
    }
}
