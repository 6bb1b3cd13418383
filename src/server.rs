//! Installed server state
//!
//! The server's own properties document: the artifacts currently deployed
//! (same key grammar as a distribution), the distribution it was created from,
//! connection settings the model never interprets, free-form `property.*`
//! values, and modules the user installed outside any distribution.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::distro::document::DistributionDoc;
use crate::model::artifact::ArtifactRef;
use crate::model::category::Category;
use crate::model::error::ModelError;
use crate::model::version::Version;
use crate::parser::namespaced::{NamespacedConfig, PROPERTY_DISTRO_GROUP_ID};

pub const PROPERTY_SERVER_ID: &str = "server.id";
pub const PROPERTY_DB_DRIVER: &str = "connection.driver_class";
pub const PROPERTY_DB_URI: &str = "connection.url";
pub const PROPERTY_DB_USER: &str = "connection.username";
pub const PROPERTY_DB_PASS: &str = "connection.password";
pub const PROPERTY_DB_NAME: &str = "database_name";
pub const PROPERTY_DISTRO_ARTIFACT_ID: &str = "distro.artifactId";
pub const PROPERTY_USER_MODULES: &str = "user_modules";

const CUSTOM_PROPERTY_PREFIX: &str = "property.";
const DISTRIBUTED_PREFIXES: [&str; 6] = ["war.", "omod.", "owa.", "config.", "content.", "spa."];
const NAME: &str = "name";
const VERSION: &str = "version";

#[derive(Debug, Clone, PartialEq)]
pub struct InstalledState {
    config: NamespacedConfig,
    user_modules: Vec<ArtifactRef>,
}

impl InstalledState {
    pub fn new(config: NamespacedConfig) -> Result<Self, ModelError> {
        let user_modules = parse_user_modules(config.get(PROPERTY_USER_MODULES))?;
        Ok(Self { config, user_modules })
    }

    pub fn parse(content: &str) -> Result<Self, ModelError> {
        Self::new(NamespacedConfig::parse(content)?)
    }

    pub fn config(&self) -> &NamespacedConfig {
        &self.config
    }

    pub fn to_properties_string(&self) -> String {
        self.config.to_properties_string()
    }

    pub fn parse_category(&self, category: Category) -> Vec<ArtifactRef> {
        self.config.parse_category(category)
    }

    pub fn platform(&self) -> Option<ArtifactRef> {
        self.config.parse_category(Category::Platform).into_iter().next()
    }

    pub fn server_id(&self) -> Option<&str> {
        self.config.get(PROPERTY_SERVER_ID)
    }

    pub fn db_driver(&self) -> Option<&str> {
        self.config.get(PROPERTY_DB_DRIVER)
    }

    pub fn db_uri(&self) -> Option<&str> {
        self.config.get(PROPERTY_DB_URI)
    }

    pub fn db_user(&self) -> Option<&str> {
        self.config.get(PROPERTY_DB_USER)
    }

    pub fn db_password(&self) -> Option<&str> {
        self.config.get(PROPERTY_DB_PASS)
    }

    pub fn db_name(&self) -> Option<&str> {
        self.config.get(PROPERTY_DB_NAME)
    }

    pub fn name(&self) -> Option<&str> {
        self.config.name()
    }

    pub fn version(&self) -> Option<&str> {
        self.config.version()
    }

    pub fn distro_artifact_id(&self) -> Option<&str> {
        self.config.get(PROPERTY_DISTRO_ARTIFACT_ID)
    }

    pub fn distro_group_id(&self) -> Option<&str> {
        self.config.get(PROPERTY_DISTRO_GROUP_ID)
    }

    /// `property.*` values with the prefix removed
    pub fn custom_properties(&self) -> BTreeMap<&str, &str> {
        self.config
            .entries()
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(CUSTOM_PROPERTY_PREFIX)
                    .map(|name| (name, value.as_str()))
            })
            .collect()
    }

    pub fn custom_property(&self, name: &str) -> Option<&str> {
        self.config.get(&format!("{CUSTOM_PROPERTY_PREFIX}{name}"))
    }

    pub fn with_custom_property(&self, name: &str, value: &str) -> Result<Self, ModelError> {
        Self::new(
            self.config
                .with_entry(format!("{CUSTOM_PROPERTY_PREFIX}{name}"), value)?,
        )
    }

    /// Placeholder lookup built from the custom properties
    pub fn placeholder_lookup(&self) -> HashMap<String, String> {
        self.custom_properties()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    /// Modules installed by the user outside the distribution
    pub fn user_modules(&self) -> &[ArtifactRef] {
        &self.user_modules
    }

    /// Record a user module; an entry with the same identity is replaced
    pub fn with_user_module(&self, artifact: &ArtifactRef) -> Result<Self, ModelError> {
        let mut modules: Vec<ArtifactRef> = self
            .user_modules
            .iter()
            .filter(|existing| !existing.same_identity(artifact))
            .cloned()
            .collect();
        modules.push(artifact.clone());
        self.with_user_modules(&modules)
    }

    pub fn without_user_module(&self, artifact: &ArtifactRef) -> Result<Self, ModelError> {
        let modules: Vec<ArtifactRef> = self
            .user_modules
            .iter()
            .filter(|existing| !existing.same_identity(artifact))
            .cloned()
            .collect();
        self.with_user_modules(&modules)
    }

    fn with_user_modules(&self, modules: &[ArtifactRef]) -> Result<Self, ModelError> {
        if modules.is_empty() {
            return Self::new(self.config.without_keys([PROPERTY_USER_MODULES])?);
        }
        let value = modules
            .iter()
            .map(|module| format!("{}/{}/{}", module.group_id, module.identity(), module.version))
            .collect::<Vec<_>>()
            .join(",");
        Self::new(self.config.with_entry(PROPERTY_USER_MODULES, value)?)
    }

    /// State after installing a distribution: every artifact, frontend, name
    /// and version key is taken from the distribution, and such keys the
    /// distribution no longer declares are dropped. Server identity,
    /// connection settings and custom properties are kept.
    pub fn apply_distribution(&self, distribution: &DistributionDoc) -> Result<Self, ModelError> {
        let mut entries: BTreeMap<String, String> = self
            .config
            .entries()
            .iter()
            .filter(|(key, _)| !is_distributed_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for (key, value) in distribution.config().entries() {
            if is_distributed_key(key) {
                entries.insert(key.clone(), value.clone());
            }
        }
        debug!("Applied distribution {:?}", distribution.name());

        Self::new(NamespacedConfig::from_entries(entries)?)
    }
}

fn is_distributed_key(key: &str) -> bool {
    key == NAME || key == VERSION || DISTRIBUTED_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

/// `group/artifact/version` entries separated by commas
fn parse_user_modules(value: Option<&str>) -> Result<Vec<ArtifactRef>, ModelError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split('/').collect::<Vec<_>>().as_slice() {
            [group_id, artifact_id, version]
                if !group_id.is_empty() && !artifact_id.is_empty() && !version.is_empty() =>
            {
                let artifact_id = if artifact_id.ends_with("-omod") {
                    artifact_id.to_string()
                } else {
                    format!("{artifact_id}-omod")
                };
                Ok(ArtifactRef::new(Category::Module, *group_id, artifact_id, Version::parse(version)?))
            }
            _ => Err(ModelError::InvalidArtifactSpec(entry.to_string())),
        })
        .collect()
}
