// src/releases.rs

//! Release enumeration for a package's upstream repository
//!
//! Tags are read with `git ls-remote`, which only queries the remote and is
//! therefore run in dry-run mode too.

use crate::error::{Error, Result};
use semver::Version;
use std::cmp::Ordering;
use std::process::Command;
use tracing::debug;

/// Number of releases shown when no depth is given
pub const DEFAULT_HISTORY_DEPTH: usize = 5;

/// The `depth` most recent tags of `remote`, newest first
pub fn releases(remote: &str, depth: usize) -> Result<Vec<String>> {
    let output = list_remote_tags(remote)?;
    let mut tags = parse_tags(&output);
    sort_newest_first(&mut tags);
    tags.truncate(depth);
    Ok(tags)
}

fn list_remote_tags(remote: &str) -> Result<String> {
    debug!("Listing tags of {}", remote);

    let output = Command::new("git")
        .args(["ls-remote", "--tags", "--refs", remote])
        .output()
        .map_err(|e| Error::Releases {
            remote: remote.to_string(),
            reason: format!("failed to run git: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Releases {
            remote: remote.to_string(),
            reason: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Tag names from `git ls-remote --tags` output
pub fn parse_tags(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter_map(|reference| reference.strip_prefix("refs/tags/"))
        .filter(|tag| !tag.ends_with("^{}"))
        .map(str::to_string)
        .collect()
}

/// Order tags newest first
///
/// Tags that read as versions (`v1.2`, `2.0.1`, ...) come first in version
/// order, the rest follow in reverse lexical order.
pub fn sort_newest_first(tags: &mut [String]) {
    tags.sort_by(|a, b| match (tag_version(a), tag_version(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    });
}

fn tag_version(tag: &str) -> Option<Version> {
    let trimmed = tag.trim_start_matches(['v', 'V']);
    if let Ok(version) = Version::parse(trimmed) {
        return Some(version);
    }

    // Pad `1` and `1.2` out to full versions
    let parts = trimmed.split('.').count();
    if parts < 3 && !trimmed.contains('-') {
        let padded = format!("{}{}", trimmed, ".0".repeat(3 - parts));
        return Version::parse(&padded).ok();
    }
    None
}
