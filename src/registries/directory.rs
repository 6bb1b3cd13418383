//! Distribution documents stored in a local directory

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::distro::document::DistributionDoc;
use crate::distro::resolver::{DistributionFetcher, FetchError};
use crate::model::artifact::ArtifactRef;

/// Fetcher reading `<dir>/<artifactId>-<version>.properties`.
///
/// The artifact id is tried as published first, then with its category
/// suffix stripped, so `referenceapplication-package:2.8.0` also matches
/// `referenceapplication-2.8.0.properties`.
pub struct DirectoryFetcher {
    directory: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn candidates(&self, artifact: &ArtifactRef) -> Vec<PathBuf> {
        let mut ids = vec![artifact.artifact_id.as_str()];
        if artifact.identity() != artifact.artifact_id {
            ids.push(artifact.identity());
        }
        ids.into_iter()
            .map(|id| {
                self.directory
                    .join(format!("{}-{}.properties", id, artifact.version))
            })
            .collect()
    }
}

impl DistributionFetcher for DirectoryFetcher {
    fn fetch_distribution(&self, artifact: &ArtifactRef) -> Result<DistributionDoc, FetchError> {
        let Some(path) = self
            .candidates(artifact)
            .into_iter()
            .find(|path| path.is_file())
        else {
            debug!("No document for {} in {}", artifact, self.directory.display());
            return Err(FetchError::NotFound(artifact.coordinates()));
        };

        let content = std::fs::read_to_string(&path).map_err(|source| {
            warn!("Failed to read {}: {}", path.display(), source);
            FetchError::Io {
                path: path.display().to_string(),
                source,
            }
        })?;

        Ok(DistributionDoc::parse(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::{Category, GROUP_DISTRO};
    use crate::model::error::ModelError;
    use crate::model::version::Version;
    use tempfile::TempDir;

    fn distro(artifact_id: &str, version: &str) -> ArtifactRef {
        ArtifactRef::new(
            Category::Distribution,
            GROUP_DISTRO,
            artifact_id,
            Version::parse(version).unwrap(),
        )
    }

    #[test]
    fn fetch_distribution_reads_matching_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("my-distro-1.0.properties"),
            "name=My Distro\nomod.appui=1.2\n",
        )
        .unwrap();

        let fetcher = DirectoryFetcher::new(temp_dir.path());
        let document = fetcher.fetch_distribution(&distro("my-distro", "1.0")).unwrap();

        assert_eq!(document.name(), Some("My Distro"));
        assert_eq!(document.config().get("omod.appui"), Some("1.2"));
    }

    #[test]
    fn fetch_distribution_falls_back_to_identity() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("referenceapplication-2.8.0.properties"),
            "name=Reference Application\n",
        )
        .unwrap();

        let fetcher = DirectoryFetcher::new(temp_dir.path());
        let document = fetcher
            .fetch_distribution(&distro("referenceapplication-package", "2.8.0"))
            .unwrap();

        assert_eq!(document.name(), Some("Reference Application"));
    }

    #[test]
    fn fetch_distribution_returns_not_found_for_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = DirectoryFetcher::new(temp_dir.path());

        let result = fetcher.fetch_distribution(&distro("missing", "1.0"));

        assert!(matches!(result, Err(FetchError::NotFound(name)) if name == "org.openmrs.distro:missing:1.0"));
    }

    #[test]
    fn fetch_distribution_propagates_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("broken-1.0.properties"), "no separator here\n").unwrap();

        let fetcher = DirectoryFetcher::new(temp_dir.path());
        let result = fetcher.fetch_distribution(&distro("broken", "1.0"));

        assert!(matches!(
            result,
            Err(FetchError::Model(ModelError::InvalidLine { line_number: 1, .. }))
        ));
    }
}
