//! Registry trait for looking up the published versions of an artifact

#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::model::artifact::ArtifactRef;
use crate::model::version::Version;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Trait for fetching artifact versions from a repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches all published versions of an artifact
    ///
    /// # Returns
    /// * `Ok(Vec<Version>)` - Versions ordered from oldest to newest
    /// * `Err(RegistryError)` - If the lookup fails
    async fn fetch_all_versions(&self, artifact: &ArtifactRef) -> Result<Vec<Version>, RegistryError>;
}
