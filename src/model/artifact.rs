//! Deployable component references

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::model::category::Category;
use crate::model::error::ModelError;
use crate::model::version::Version;

/// One deployable component: Maven coordinates plus category metadata.
///
/// Equality and hashing use `(group_id, artifact_id, version)` only. For
/// matching the same component across two states use
/// [`ArtifactRef::same_identity`], which ignores the version.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Version,
    pub category: Category,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub file_extension: String,
}

impl ArtifactRef {
    /// Create a reference with the category's default type and file extension
    pub fn new(
        category: Category,
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: Version,
    ) -> Self {
        let artifact_type = category.defaults().artifact_type;
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version,
            category,
            artifact_type: artifact_type.to_string(),
            file_extension: category.file_extension_for(artifact_type).to_string(),
        }
    }

    /// Override the packaging type; the file extension follows unless the
    /// category pins it
    pub fn with_type(mut self, artifact_type: impl Into<String>) -> Self {
        self.artifact_type = artifact_type.into();
        self.file_extension = self
            .category
            .file_extension_for(&self.artifact_type)
            .to_string();
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Parse `group:artifact:version` or `artifact:version`.
    ///
    /// The group defaults to the category's default group.
    pub fn parse_coordinates(spec: &str, category: Category) -> Result<Self, ModelError> {
        let parts: Vec<&str> = spec.trim().split(':').map(str::trim).collect();
        let (group_id, artifact_id, version) = match parts.as_slice() {
            [group_id, artifact_id, version] => (*group_id, *artifact_id, *version),
            [artifact_id, version] => (category.default_group_id(None), *artifact_id, *version),
            _ => return Err(ModelError::InvalidArtifactSpec(spec.to_string())),
        };
        if group_id.is_empty() || artifact_id.is_empty() || version.is_empty() {
            return Err(ModelError::InvalidArtifactSpec(spec.to_string()));
        }
        Ok(Self::new(category, group_id, artifact_id, Version::parse(version)?))
    }

    /// Artifact id with the category suffix (`-omod`, `-webapp`) stripped
    pub fn identity(&self) -> &str {
        self.category.identity_of(&self.artifact_id)
    }

    pub fn same_identity(&self, other: &ArtifactRef) -> bool {
        self.identity() == other.identity()
    }

    /// Same component at a higher version, or both at the same snapshot
    /// version (the snapshot build may have been replaced).
    pub fn is_upgrade_of(&self, previous: &ArtifactRef) -> bool {
        self.same_identity(previous)
            && (self.version > previous.version || self.version.is_equal_snapshot_of(&previous.version))
    }

    pub fn is_downgrade_of(&self, previous: &ArtifactRef) -> bool {
        self.same_identity(previous) && self.version < previous.version
    }

    /// File name of the deployed artifact, e.g. `appui-1.2.omod`
    pub fn dest_file_name(&self) -> String {
        let id = match self.artifact_id.rsplit_once('-') {
            Some((id, "omod" | "webapp")) => id,
            _ => self.artifact_id.as_str(),
        };
        format!("{}-{}.{}", id, self.version, self.file_extension)
    }

    /// `group:artifact:version`
    pub fn coordinates(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl PartialEq for ArtifactRef {
    fn eq(&self, other: &Self) -> bool {
        self.group_id == other.group_id
            && self.artifact_id == other.artifact_id
            && self.version == other.version
    }
}

impl Eq for ArtifactRef {}

impl Hash for ArtifactRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.group_id.hash(state);
        self.artifact_id.hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coordinates())
    }
}
