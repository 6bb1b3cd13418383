//! Distribution documents for tests

use std::collections::HashMap;
use std::path::Path;

use tempfile::TempDir;

use distro_state::distro::{DistributionDoc, DistributionFetcher, FetchError};
use distro_state::model::artifact::ArtifactRef;
use distro_state::parser::NamespacedConfig;

/// In-memory fetcher keyed by `group:artifact:version`
pub struct MemoryFetcher {
    documents: HashMap<String, String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
        }
    }

    pub fn with_document(mut self, coordinates: &str, content: &str) -> Self {
        self.documents.insert(coordinates.to_string(), content.to_string());
        self
    }
}

impl DistributionFetcher for MemoryFetcher {
    fn fetch_distribution(&self, artifact: &ArtifactRef) -> Result<DistributionDoc, FetchError> {
        let coordinates = artifact.coordinates();
        match self.documents.get(&coordinates) {
            Some(content) => Ok(DistributionDoc::parse(content)?),
            None => Err(FetchError::NotFound(coordinates)),
        }
    }
}

pub fn config(content: &str) -> NamespacedConfig {
    NamespacedConfig::parse(content).unwrap()
}

pub fn document(content: &str) -> DistributionDoc {
    DistributionDoc::parse(content).unwrap()
}

/// Write `name -> content` files into a fresh directory
pub fn create_distribution_dir(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (name, content) in files {
        write_file(temp_dir.path(), name, content);
    }
    temp_dir
}

fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}
