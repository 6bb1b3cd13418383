//! Parent chain resolution
//!
//! A distribution's effective declarations are its own entries merged over the
//! effective declarations of its parent, recursively. Parents are obtained
//! through a [`DistributionFetcher`]; legacy reference application versions are
//! served from the built-in table in [`crate::distro::legacy`] instead.

#[cfg(test)]
use mockall::automock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::distro::document::DistributionDoc;
use crate::distro::legacy;
use crate::model::artifact::ArtifactRef;
use crate::model::category::{Category, GROUP_DISTRO, GROUP_MODULE, GROUP_OPENMRS, TYPE_JAR, TYPE_ZIP};
use crate::model::error::ModelError;

pub const REFAPP_2X_ARTIFACT_ID: &str = "referenceapplication-package";
pub const REFAPP_3X_PRERELEASE_ARTIFACT_ID: &str = "referenceapplication-distro";
pub const REFAPP_3X_ARTIFACT_ID: &str = "distro-emr-configuration";

const REFAPP_IDENTITIES: [&str; 2] = ["referenceapplication", REFAPP_3X_ARTIFACT_ID];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Distribution not found: {0}")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Failed to fetch {artifact}: {source}")]
    Fetch {
        artifact: String,
        #[source]
        source: FetchError,
    },

    #[error("Distribution inheritance cycle: {0}")]
    Cycle(String),
}

/// Source of distribution documents by reference
#[cfg_attr(test, automock)]
pub trait DistributionFetcher {
    /// Returns the document declared by the distribution artifact
    fn fetch_distribution(&self, artifact: &ArtifactRef) -> Result<DistributionDoc, FetchError>;
}

/// A distribution resolved against its whole parent chain
#[derive(Debug, Clone)]
pub struct Distribution {
    /// Where the document came from; `None` for a local document
    pub artifact: Option<ArtifactRef>,
    /// The distribution's own declarations
    pub document: DistributionDoc,
    pub parent: Option<Box<Distribution>>,
    /// Own declarations merged over the parent's effective declarations
    pub effective: DistributionDoc,
}

impl Distribution {
    pub fn name(&self) -> Option<&str> {
        self.document.name()
    }

    pub fn version(&self) -> Option<&str> {
        self.document.version()
    }

    /// Parent, grandparent, ... in order
    pub fn ancestors(&self) -> impl Iterator<Item = &Distribution> {
        std::iter::successors(self.parent.as_deref(), |distribution| {
            distribution.parent.as_deref()
        })
    }
}

/// Map user-friendly distribution coordinates to the artifact actually
/// published: the reference application moved between coordinates over its
/// major versions, and module distributions are published as `-omod` jars.
pub fn normalize_distribution_ref(artifact: ArtifactRef) -> ArtifactRef {
    let mut group_id = artifact.group_id.clone();
    let mut artifact_id = artifact.artifact_id.clone();
    let mut artifact_type = artifact.artifact_type.clone();
    let version = &artifact.version;

    let identity = Category::Distribution.identity_of(&artifact.artifact_id);
    if (group_id == GROUP_DISTRO || group_id == GROUP_OPENMRS) && REFAPP_IDENTITIES.contains(&identity) {
        let (group, id, kind) = if version.major() <= 2 {
            (GROUP_DISTRO, REFAPP_2X_ARTIFACT_ID, TYPE_JAR)
        } else if version.major() == 3 && (version.is_alpha() || version.is_beta() || version.is_snapshot()) {
            (GROUP_DISTRO, REFAPP_3X_PRERELEASE_ARTIFACT_ID, TYPE_ZIP)
        } else {
            (GROUP_OPENMRS, REFAPP_3X_ARTIFACT_ID, TYPE_ZIP)
        };
        group_id = group.to_string();
        artifact_id = id.to_string();
        artifact_type = kind.to_string();
    }

    if group_id == GROUP_MODULE && !artifact_id.ends_with("-omod") {
        artifact_id.push_str("-omod");
        artifact_type = TYPE_JAR.to_string();
    }

    ArtifactRef::new(Category::Distribution, group_id, artifact_id, artifact.version.clone())
        .with_type(artifact_type)
}

/// Parse `group:artifact:version` or `artifact:version` into a normalized
/// distribution reference
pub fn parse_distribution_ref(spec: &str) -> Result<ArtifactRef, ModelError> {
    ArtifactRef::parse_coordinates(spec, Category::Distribution).map(normalize_distribution_ref)
}

/// Resolves documents and references through a fetcher
pub struct DistributionResolver<'a, F: DistributionFetcher + ?Sized> {
    fetcher: &'a F,
}

impl<'a, F: DistributionFetcher + ?Sized> DistributionResolver<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    /// Resolve a local document
    pub fn resolve(&self, document: &DistributionDoc) -> Result<Distribution, ResolveError> {
        self.resolve_chain(None, document.clone(), &mut Vec::new())
    }

    /// Fetch and resolve a distribution by reference
    pub fn resolve_artifact(&self, artifact: &ArtifactRef) -> Result<Distribution, ResolveError> {
        let artifact = normalize_distribution_ref(artifact.clone());
        let document = self.fetch(&artifact)?;
        self.resolve_chain(Some(artifact), document, &mut Vec::new())
    }

    /// Fetch one document, consulting the legacy table first
    pub fn fetch(&self, artifact: &ArtifactRef) -> Result<DistributionDoc, ResolveError> {
        if let Some(document) = legacy::lookup(artifact)? {
            info!("Using built-in document for {}", artifact);
            return Ok(document);
        }

        debug!("Fetching distribution {}", artifact);
        self.fetcher.fetch_distribution(artifact).map_err(|source| {
            warn!("Failed to fetch distribution {}: {}", artifact, source);
            ResolveError::Fetch {
                artifact: artifact.coordinates(),
                source,
            }
        })
    }

    fn resolve_chain(
        &self,
        artifact: Option<ArtifactRef>,
        document: DistributionDoc,
        chain: &mut Vec<String>,
    ) -> Result<Distribution, ResolveError> {
        if let Some(artifact) = &artifact {
            let coordinates = artifact.coordinates();
            if chain.contains(&coordinates) {
                chain.push(coordinates);
                return Err(ResolveError::Cycle(chain.join(" -> ")));
            }
            chain.push(coordinates);
        }

        let Some(parent_ref) = document.parent_ref().cloned() else {
            return Ok(Distribution {
                artifact,
                effective: document.clone(),
                document,
                parent: None,
            });
        };

        info!("Resolving parent distribution {}", parent_ref);
        let parent_document = self.fetch(&parent_ref)?;
        let parent = self.resolve_chain(Some(parent_ref), parent_document, chain)?;
        let effective = document.merged_over(&parent.effective)?;

        Ok(Distribution {
            artifact,
            document,
            parent: Some(Box::new(parent)),
            effective,
        })
    }
}
