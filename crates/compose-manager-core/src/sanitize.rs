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

//! Reduce noisy compose/pull output to a single human-readable line

/// Progress chatter emitted by pulls; never the interesting part of a failure
const PROGRESS_MARKERS: [&str; 6] = [
    "Pulling",
    "Downloaded",
    "Digest:",
    "Status:",
    "Waiting",
    "Extracting",
];

const ERROR_KEYWORDS: [&str; 4] = ["Error", "error", "failed", "cannot"];

fn is_noise(line: &str) -> bool {
    PROGRESS_MARKERS.iter().any(|marker| line.contains(marker))
        || line.starts_with("Traceback")
        || line.starts_with("File ")
        || line.contains("raise error_to_reraise")
        || line.contains("raise err from")
        || (line.contains("line ") && line.contains(".py"))
}

/// `module.sub.KeyError: 'x'` -> `KeyError: 'x'`
fn typed_error(line: &str) -> Option<String> {
    if !line.contains("Error:") && !line.contains("Exception:") {
        return None;
    }
    let (kind, message) = line.split_once(':')?;
    let kind = kind.trim();
    let kind = kind.rsplit('.').next().unwrap_or(kind);
    Some(format!("{kind}: {}", message.trim()))
}

/// Drop an echoed command line that precedes the actual error text
fn strip_command_echo(line: &str) -> &str {
    if !line.contains("docker") {
        return line;
    }
    match line.find("Error").or_else(|| line.find("error")) {
        Some(start) => &line[start..],
        None => line,
    }
}

/// Pick the most informative line of a failed command's output.
///
/// The first typed error (`...Error:` / `...Exception:`) wins outright.
/// Otherwise the last line mentioning an error keyword is used, and failing
/// that the last non-empty line. Returns `None` for blank output.
pub fn summarize_output(output: &str) -> Option<String> {
    let mut candidate: Option<String> = None;

    for line in output.lines().map(str::trim) {
        if line.is_empty() || is_noise(line) {
            continue;
        }
        if let Some(typed) = typed_error(line) {
            candidate = Some(typed);
            break;
        }
        if ERROR_KEYWORDS.iter().any(|keyword| line.contains(keyword)) {
            candidate = Some(line.to_owned());
        }
    }

    let line = candidate.or_else(|| {
        output
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_owned)
    })?;

    Some(strip_command_echo(&line).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_traceback_reduces_to_key_error() {
        let output = "\
Pulling web ... done
Recreating app_web_1 ...
Traceback (most recent call last):
  File \"/usr/bin/docker-compose\", line 33, in <module>
    sys.exit(load_entry_point('docker-compose==1.29.2')())
  File \"/usr/lib/python3/dist-packages/compose/cli/main.py\", line 81, in main
    command_func()
  File \"/usr/lib/python3/dist-packages/compose/parallel.py\", line 108, in parallel_execute
    raise error_to_reraise
KeyError: 'ContainerConfig'
";
        assert_eq!(
            summarize_output(output).as_deref(),
            Some("KeyError: 'ContainerConfig'")
        );
    }

    #[test]
    fn test_qualified_error_type_is_shortened() {
        let output = "docker.errors.ImageNotFound: 404 Client Error: Not Found";
        assert_eq!(
            summarize_output(output).as_deref(),
            Some("ImageNotFound: 404 Client Error: Not Found")
        );
    }

    #[test]
    fn test_last_keyword_line_wins() {
        let output = "\
Status: Downloaded newer image for nginx:latest
cannot connect to network proxy
pull access denied for private/app, repository does not exist
service web failed to start
";
        assert_eq!(
            summarize_output(output).as_deref(),
            Some("service web failed to start")
        );
    }

    #[test]
    fn test_command_echo_is_stripped() {
        let output = "docker compose up -d: Error response from daemon: port is already allocated";
        assert_eq!(
            summarize_output(output).as_deref(),
            Some("Error response from daemon: port is already allocated")
        );
    }

    #[test]
    fn test_falls_back_to_last_line() {
        let output = "Pulling db ... done\n\nsomething odd happened\n";
        assert_eq!(
            summarize_output(output).as_deref(),
            Some("something odd happened")
        );
    }

    #[test]
    fn test_blank_output() {
        assert_eq!(summarize_output(""), None);
        assert_eq!(summarize_output("  \n \n"), None);
    }
}
