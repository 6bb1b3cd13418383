//! Version suggestions for an artifact
//!
//! Given every published version, produce a short list a user can pick from:
//! newest first, at most one entry per minor line, releases preferred over
//! the snapshots they supersede, but the newest unreleased snapshot kept.

use tracing::debug;

use crate::model::artifact::ArtifactRef;
use crate::model::error::ModelError;
use crate::model::version::Version;
use crate::registry::{Registry, RegistryError};

/// Default number of suggestions
pub const DEFAULT_MAX_SUGGESTIONS: usize = 6;

/// Keyword resolving to the newest release
pub const LATEST: &str = "LATEST";
/// Keyword resolving to the newest snapshot
pub const LATEST_SNAPSHOT: &str = "LATEST-SNAPSHOT";

/// Snapshots allowed in one suggestion list
const MAX_SNAPSHOTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionAdvisor {
    max_suggestions: usize,
}

impl VersionAdvisor {
    /// `max_suggestions` below one is raised to one
    pub fn new(max_suggestions: usize) -> Self {
        Self {
            max_suggestions: max_suggestions.max(1),
        }
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    pub fn advise(&self, versions: &[Version]) -> Vec<Version> {
        advise(versions, self.max_suggestions)
    }

    /// Look up the artifact's versions and shortlist them
    pub async fn suggest(
        &self,
        registry: &dyn Registry,
        artifact: &ArtifactRef,
    ) -> Result<Vec<Version>, RegistryError> {
        let versions = registry.fetch_all_versions(artifact).await?;
        debug!("{} versions published for {}", versions.len(), artifact);
        Ok(self.advise(&versions))
    }
}

impl Default for VersionAdvisor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUGGESTIONS)
    }
}

/// Shortlist at most `max` versions, strictly descending.
///
/// Alpha, beta and other qualified pre-releases are never suggested. Walking
/// the remaining versions newest first, the first one is always kept; a
/// version on the same (major, minor) line as the last kept one is kept only
/// when it is the release following a newer snapshot; a version on a new line
/// is kept unless it is a snapshot and two snapshots were already kept.
pub fn advise(versions: &[Version], max: usize) -> Vec<Version> {
    if max == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<&Version> = versions.iter().filter(|v| is_suggestible(v)).collect();
    sorted.sort_by(|a, b| b.cmp(a));

    let mut advice: Vec<Version> = Vec::new();
    let mut snapshots = 0;
    for version in sorted {
        let keep = match advice.last() {
            None => true,
            Some(previous) if same_line(previous, version) => {
                previous.is_snapshot()
                    && version.is_release()
                    && !previous.same_numbers(version)
            }
            Some(_) => !version.is_snapshot() || snapshots < MAX_SNAPSHOTS,
        };

        if keep {
            if version.is_snapshot() {
                snapshots += 1;
            }
            advice.push(version.clone());
            if advice.len() >= max {
                break;
            }
        }
    }

    advice
}

/// Newest release, or the newest version of any kind when nothing was released
pub fn latest_release(versions: &[Version]) -> Option<&Version> {
    versions
        .iter()
        .filter(|v| v.is_release())
        .max()
        .or_else(|| versions.iter().max())
}

pub fn latest_snapshot(versions: &[Version]) -> Option<&Version> {
    versions.iter().filter(|v| v.is_snapshot()).max()
}

/// Resolve `LATEST` / `LATEST-SNAPSHOT` (case-insensitive) against the
/// published versions; any other value is parsed as a plain version.
pub fn resolve_version_keyword(requested: &str, versions: &[Version]) -> Result<Version, ModelError> {
    let requested = requested.trim();
    let resolved = if requested.eq_ignore_ascii_case(LATEST_SNAPSHOT) {
        latest_snapshot(versions)
    } else if requested.eq_ignore_ascii_case(LATEST) {
        latest_release(versions)
    } else {
        return Version::parse(requested);
    };

    resolved
        .cloned()
        .ok_or_else(|| ModelError::NoVersionAvailable(requested.to_string()))
}

fn is_suggestible(version: &Version) -> bool {
    version.is_release() || version.is_snapshot()
}

fn same_line(a: &Version, b: &Version) -> bool {
    a.major() == b.major() && a.minor() == b.minor()
}
