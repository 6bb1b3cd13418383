//! Distribution documents: declared component versions plus an optional parent

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::distro::resolver::{DistributionFetcher, DistributionResolver, ResolveError, normalize_distribution_ref};
use crate::model::artifact::ArtifactRef;
use crate::model::category::{Category, TYPE_ZIP};
use crate::model::error::ModelError;
use crate::model::version::Version;
use crate::parser::namespaced::{NamespacedConfig, PROPERTY_DISTRO_GROUP_ID};

pub const PROPERTY_EXCLUSIONS: &str = "exclusions";
pub const PROPERTY_DISTRO_ARTIFACT_ID: &str = "distro.artifactId";
pub const PROPERTY_DISTRO_VERSION: &str = "distro.version";
pub const PROPERTY_DISTRO_TYPE: &str = "distro.type";
pub const PROPERTY_PARENT_ARTIFACT_ID: &str = "parent.artifactId";
pub const PROPERTY_PARENT_GROUP_ID: &str = "parent.groupId";
pub const PROPERTY_PARENT_VERSION: &str = "parent.version";
pub const PROPERTY_PARENT_TYPE: &str = "parent.type";

const DISTRO_PREFIX: &str = "distro.";
const PARENT_PREFIX: &str = "parent.";
const CUSTOM_PROPERTY_PREFIX: &str = "property.";
const CUSTOM_PROPERTY_DEFAULT: &str = ".default";
const CUSTOM_PROPERTY_PROMPT: &str = ".prompt";

/// A distribution's own declarations, before inheritance.
///
/// The parent reference is read once at construction, so a document with
/// conflicting parent declarations never exists.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionDoc {
    config: NamespacedConfig,
    parent: Option<ArtifactRef>,
}

impl DistributionDoc {
    pub fn new(config: NamespacedConfig) -> Result<Self, ModelError> {
        let parent = parent_ref_of(&config)?;
        Ok(Self { config, parent })
    }

    pub fn parse(content: &str) -> Result<Self, ModelError> {
        Self::new(NamespacedConfig::parse(content)?)
    }

    pub fn config(&self) -> &NamespacedConfig {
        &self.config
    }

    pub fn into_config(self) -> NamespacedConfig {
        self.config
    }

    /// Normalized reference to the parent distribution, if any
    pub fn parent_ref(&self) -> Option<&ArtifactRef> {
        self.parent.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.config.name()
    }

    pub fn version(&self) -> Option<&str> {
        self.config.version()
    }

    pub fn parse_category(&self, category: Category) -> Vec<ArtifactRef> {
        self.config.parse_category(category)
    }

    /// The single platform artifact, if declared
    pub fn platform(&self) -> Option<ArtifactRef> {
        self.config.parse_category(Category::Platform).into_iter().next()
    }

    /// Keys removed from the inherited parent entries before merging
    pub fn exclusions(&self) -> Vec<&str> {
        self.config
            .get(PROPERTY_EXCLUSIONS)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn with_exclusion(&self, key: &str) -> Result<Self, ModelError> {
        let exclusions = match self.config.get(PROPERTY_EXCLUSIONS) {
            Some(existing) if !existing.trim().is_empty() => format!("{existing},{key}"),
            _ => key.to_string(),
        };
        Self::new(self.config.with_entry(PROPERTY_EXCLUSIONS, exclusions)?)
    }

    /// Names declared under `property.<name>`
    pub fn custom_property_names(&self) -> BTreeSet<&str> {
        self.config
            .entries()
            .keys()
            .filter_map(|key| key.strip_prefix(CUSTOM_PROPERTY_PREFIX))
            .map(|name| {
                name.strip_suffix(CUSTOM_PROPERTY_DEFAULT)
                    .or_else(|| name.strip_suffix(CUSTOM_PROPERTY_PROMPT))
                    .unwrap_or(name)
            })
            .collect()
    }

    pub fn custom_property(&self, name: &str) -> Option<&str> {
        self.config.get(&format!("{CUSTOM_PROPERTY_PREFIX}{name}"))
    }

    pub fn custom_property_default(&self, name: &str) -> Option<&str> {
        self.config
            .get(&format!("{CUSTOM_PROPERTY_PREFIX}{name}{CUSTOM_PROPERTY_DEFAULT}"))
    }

    pub fn custom_property_prompt(&self, name: &str) -> Option<&str> {
        self.config
            .get(&format!("{CUSTOM_PROPERTY_PREFIX}{name}{CUSTOM_PROPERTY_PROMPT}"))
    }

    pub fn resolve_placeholders(&self, lookup: &HashMap<String, String>) -> Result<Self, ModelError> {
        Self::new(self.config.resolve_placeholders(lookup)?)
    }

    /// Effective document after applying the whole parent chain
    pub fn resolve<F>(&self, fetcher: &F) -> Result<DistributionDoc, ResolveError>
    where
        F: DistributionFetcher + ?Sized,
    {
        match self.parent {
            None => Ok(self.clone()),
            Some(_) => Ok(DistributionResolver::new(fetcher).resolve(self)?.effective),
        }
    }

    /// Merge this document over an already resolved parent.
    ///
    /// The parent's parent references and the excluded keys are dropped, every
    /// parent artifact that shares an identity with one of ours loses all of
    /// its keys, then our own entries (minus parent references) are applied.
    pub fn merged_over(&self, parent: &DistributionDoc) -> Result<DistributionDoc, ModelError> {
        let mut entries: BTreeMap<String, String> = parent
            .config
            .entries()
            .iter()
            .filter(|(key, _)| !is_parent_namespace(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for exclusion in self.exclusions() {
            entries.remove(exclusion);
        }

        let inherited = NamespacedConfig::from_entries(entries.clone())?;
        for category in Category::ALL {
            let ours = self.config.declared(category);
            if ours.is_empty() {
                continue;
            }
            for theirs in inherited.declared(category) {
                let replaced = category == Category::FrontendApp
                    || ours
                        .iter()
                        .any(|declared| declared.artifact.same_identity(&theirs.artifact));
                if replaced {
                    for key in inherited.keys_of(theirs) {
                        debug!("Child distribution replaces {}", key);
                        entries.remove(&key);
                    }
                }
            }
        }

        let own_parent_keys = self.parent_ref_keys();
        for (key, value) in self.config.entries() {
            if key != PROPERTY_EXCLUSIONS && !own_parent_keys.contains(key) {
                entries.insert(key.clone(), value.clone());
            }
        }

        Self::new(NamespacedConfig::from_entries(entries)?)
    }

    /// Keys that declare this document's parent
    fn parent_ref_keys(&self) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self
            .config
            .entries()
            .keys()
            .filter(|key| {
                key.starts_with(PARENT_PREFIX)
                    || [PROPERTY_DISTRO_ARTIFACT_ID, PROPERTY_DISTRO_VERSION, PROPERTY_DISTRO_TYPE]
                        .contains(&key.as_str())
            })
            .cloned()
            .collect();
        for declared in self.config.declared(Category::Distribution) {
            keys.extend(self.config.keys_of(declared));
        }
        keys
    }
}

fn is_parent_namespace(key: &str) -> bool {
    key.starts_with(DISTRO_PREFIX) || key.starts_with(PARENT_PREFIX)
}

/// Collect every parent declaration; more than one is a conflict
fn parent_ref_of(config: &NamespacedConfig) -> Result<Option<ArtifactRef>, ModelError> {
    let mut declarations = config.parse_category(Category::Distribution);

    if let Some(artifact_id) = config.get(PROPERTY_DISTRO_ARTIFACT_ID) {
        let version = config.get(PROPERTY_DISTRO_VERSION).ok_or_else(|| {
            ModelError::InvalidArtifactSpec(format!(
                "{PROPERTY_DISTRO_ARTIFACT_ID}={artifact_id} without {PROPERTY_DISTRO_VERSION}"
            ))
        })?;
        let group_id = Category::Distribution.default_group_id(config.get(PROPERTY_DISTRO_GROUP_ID));
        let mut artifact = ArtifactRef::new(Category::Distribution, group_id, artifact_id, Version::parse(version)?);
        if let Some(artifact_type) = config.get(PROPERTY_DISTRO_TYPE) {
            artifact = artifact.with_type(artifact_type);
        }
        declarations.push(artifact);
    }

    if let Some(artifact_id) = config.get(PROPERTY_PARENT_ARTIFACT_ID) {
        let (Some(group_id), Some(version)) = (
            config.get(PROPERTY_PARENT_GROUP_ID),
            config.get(PROPERTY_PARENT_VERSION),
        ) else {
            return Err(ModelError::InvalidArtifactSpec(format!(
                "{PROPERTY_PARENT_ARTIFACT_ID}={artifact_id} requires {PROPERTY_PARENT_GROUP_ID} and {PROPERTY_PARENT_VERSION}"
            )));
        };
        let artifact = ArtifactRef::new(Category::Distribution, group_id, artifact_id, Version::parse(version)?)
            .with_type(config.get(PROPERTY_PARENT_TYPE).unwrap_or(TYPE_ZIP));
        declarations.push(artifact);
    }

    match declarations.len() {
        0 => Ok(None),
        1 => Ok(declarations.pop().map(normalize_distribution_ref)),
        _ => Err(ModelError::ConflictingParentDeclaration(
            declarations
                .iter()
                .map(ArtifactRef::coordinates)
                .collect::<Vec<_>>()
                .join(", "),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::{GROUP_DISTRO, GROUP_OPENMRS, TYPE_JAR};
    use rstest::rstest;

    #[rstest]
    #[case("distro.referenceapplication=2.8.0\n", GROUP_DISTRO, "referenceapplication-package", "2.8.0", TYPE_JAR)]
    #[case("distro.artifactId=referenceapplication\ndistro.groupId=org.openmrs.distro\ndistro.version=3.0.0\n", GROUP_OPENMRS, "distro-emr-configuration", "3.0.0", TYPE_ZIP)]
    #[case("parent.artifactId=distro-emr-configuration\nparent.groupId=org.openmrs\nparent.version=3.0.0-SNAPSHOT\n", GROUP_DISTRO, "referenceapplication-distro", "3.0.0-SNAPSHOT", TYPE_ZIP)]
    #[case("parent.artifactId=my-distro\nparent.groupId=org.example\nparent.version=1.0\nparent.type=jar\n", "org.example", "my-distro", "1.0", TYPE_JAR)]
    #[case("distro.mydistro=1.0\ndistro.mydistro.groupId=org.example\ndistro.mydistro.type=zip\n", "org.example", "mydistro", "1.0", TYPE_ZIP)]
    fn parent_ref_reads_every_declaration_style(
        #[case] content: &str,
        #[case] group_id: &str,
        #[case] artifact_id: &str,
        #[case] version: &str,
        #[case] artifact_type: &str,
    ) {
        let doc = DistributionDoc::parse(content).unwrap();
        let parent = doc.parent_ref().unwrap();

        assert_eq!(parent.group_id, group_id);
        assert_eq!(parent.artifact_id, artifact_id);
        assert_eq!(parent.version.as_str(), version);
        assert_eq!(parent.artifact_type, artifact_type);
    }

    #[test]
    fn document_without_parent_has_no_parent_ref() {
        let doc = DistributionDoc::parse("name=demo\ndistro.groupId=org.example\nomod.appui=1.2\n").unwrap();
        assert!(doc.parent_ref().is_none());
    }

    #[rstest]
    #[case("distro.a=1.0\ndistro.b=1.0\n")]
    #[case("distro.a=1.0\nparent.artifactId=b\nparent.groupId=g\nparent.version=1.0\n")]
    fn multiple_parents_conflict(#[case] content: &str) {
        assert!(matches!(
            DistributionDoc::parse(content),
            Err(ModelError::ConflictingParentDeclaration(_))
        ));
    }

    #[rstest]
    #[case("parent.artifactId=b\nparent.version=1.0\n")]
    #[case("parent.artifactId=b\nparent.groupId=g\n")]
    #[case("distro.artifactId=b\n")]
    fn incomplete_parent_declaration_is_rejected(#[case] content: &str) {
        assert!(matches!(
            DistributionDoc::parse(content),
            Err(ModelError::InvalidArtifactSpec(_))
        ));
    }

    #[test]
    fn exclusions_are_trimmed_and_extendable() {
        let doc = DistributionDoc::parse("exclusions=omod.a, omod.b,,\n").unwrap();
        assert_eq!(doc.exclusions(), vec!["omod.a", "omod.b"]);

        let doc = doc.with_exclusion("owa.c").unwrap();
        assert_eq!(doc.exclusions(), vec!["omod.a", "omod.b", "owa.c"]);

        let doc = DistributionDoc::parse("name=x\n").unwrap().with_exclusion("omod.a").unwrap();
        assert_eq!(doc.exclusions(), vec!["omod.a"]);
    }

    #[test]
    fn custom_properties_expose_value_default_and_prompt() {
        let doc = DistributionDoc::parse(
            "property.site.name=Clinic\nproperty.locale.default=en\nproperty.locale.prompt=Default locale\n",
        )
        .unwrap();

        assert_eq!(
            doc.custom_property_names().into_iter().collect::<Vec<_>>(),
            vec!["locale", "site.name"]
        );
        assert_eq!(doc.custom_property("site.name"), Some("Clinic"));
        assert_eq!(doc.custom_property("locale"), None);
        assert_eq!(doc.custom_property_default("locale"), Some("en"));
        assert_eq!(doc.custom_property_prompt("locale"), Some("Default locale"));
    }

    #[test]
    fn merged_over_lets_child_win_in_both_directions() {
        let parent = DistributionDoc::parse(
            "name=parent\nwar.openmrs=2.6.0\nomod.appui=1.5\nomod.legacyui=1.4\nomod.legacyui.type=omod\nowa.sysadmin=1.1\n",
        )
        .unwrap();
        let child = DistributionDoc::parse(
            "name=child\ndistro.parent=1.0\nomod.appui=1.2\nomod.legacyui=1.6\nomod.drugs=0.2-SNAPSHOT\n",
        )
        .unwrap();

        let merged = child.merged_over(&parent).unwrap();

        assert_eq!(merged.name(), Some("child"));
        assert_eq!(merged.config().get("omod.appui"), Some("1.2"));
        assert_eq!(merged.config().get("omod.legacyui"), Some("1.6"));
        assert_eq!(merged.config().get("omod.legacyui.type"), None);
        assert_eq!(merged.config().get("omod.drugs"), Some("0.2-SNAPSHOT"));
        assert_eq!(merged.config().get("owa.sysadmin"), Some("1.1"));
        assert_eq!(merged.platform().unwrap().version.as_str(), "2.6.0");
        assert!(merged.parent_ref().is_none());
        assert!(merged.config().get("distro.parent").is_none());
    }

    #[test]
    fn merged_over_applies_exclusions_and_drops_grandparent_refs() {
        let parent = DistributionDoc::parse(
            "distro.grandparent=1.0\nomod.appui=1.5\nomod.owa=1.5\nspa.apiUrl=/openmrs\n",
        )
        .unwrap();
        let child = DistributionDoc::parse("distro.parent=1.0\nexclusions=omod.owa\n").unwrap();

        let merged = child.merged_over(&parent).unwrap();

        assert_eq!(merged.config().get("omod.owa"), None);
        assert_eq!(merged.config().get("omod.appui"), Some("1.5"));
        assert_eq!(merged.config().get("spa.apiUrl"), Some("/openmrs"));
        assert_eq!(merged.config().get(PROPERTY_EXCLUSIONS), None);
        assert!(merged.parent_ref().is_none());
    }

    #[test]
    fn merged_over_replaces_parent_frontend_bundle() {
        let parent = DistributionDoc::parse(
            "spa.artifactId=old-frontend\nspa.version=1.0\nspa.type=jar\nspa.apiUrl=/openmrs\n",
        )
        .unwrap();
        let child = DistributionDoc::parse("spa.artifactId=new-frontend\nspa.version=2.0\n").unwrap();

        let merged = child.merged_over(&parent).unwrap();
        let frontend = merged.parse_category(Category::FrontendApp);

        assert_eq!(frontend.len(), 1);
        assert_eq!(frontend[0].artifact_id, "new-frontend");
        assert_eq!(frontend[0].artifact_type, TYPE_ZIP);
        assert_eq!(merged.config().get("spa.apiUrl"), Some("/openmrs"));
    }
}
