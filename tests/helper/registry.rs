//! Registry test utilities

use std::collections::HashMap;

use async_trait::async_trait;

use distro_state::model::artifact::ArtifactRef;
use distro_state::model::version::Version;
use distro_state::registry::{Registry, RegistryError};

/// Mock registry keyed by `group:artifact`
pub struct MockRegistry {
    versions: HashMap<String, Vec<String>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            versions: HashMap::new(),
        }
    }

    pub fn with_versions(mut self, package: &str, versions: Vec<&str>) -> Self {
        self.versions.insert(
            package.to_string(),
            versions.into_iter().map(|v| v.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn fetch_all_versions(&self, artifact: &ArtifactRef) -> Result<Vec<Version>, RegistryError> {
        let package = format!("{}:{}", artifact.group_id, artifact.artifact_id);
        match self.versions.get(&package) {
            Some(versions) => versions
                .iter()
                .map(|v| Version::parse(v).map_err(|e| RegistryError::InvalidResponse(e.to_string())))
                .collect(),
            None => Err(RegistryError::NotFound(package)),
        }
    }
}
