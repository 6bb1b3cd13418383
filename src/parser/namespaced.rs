//! Typed view over a flat, namespaced key/value document
//!
//! Key grammar:
//! - `<category>.<id>=<version>` declares an artifact (`omod.appui=1.2`)
//! - `<category>.<id>.<suffix>=<value>` overrides one of its attributes
//!   (`omod.appui.groupId=org.example`); suffix keys are never artifacts
//! - `spa.*` is the frontend namespace: `spa.artifactId`, `spa.groupId`,
//!   `spa.version`, `spa.type` and `spa.includes` describe the frontend bundle,
//!   every other `spa.*` key is a build property
//! - anything else is passed through untouched

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::artifact::ArtifactRef;
use crate::model::category::Category;
use crate::model::error::ModelError;
use crate::model::version::Version;
use crate::parser::properties::{parse_properties, write_properties};

pub const ARTIFACT_ID: &str = "artifactId";
pub const GROUP_ID: &str = "groupId";
pub const TYPE: &str = "type";
pub const VERSION: &str = "version";
pub const INCLUDES: &str = "includes";
pub const NAMESPACE: &str = "namespace";
pub const VARS: &str = "vars";
pub const NAME: &str = "name";

pub const PROPERTY_DISTRO_GROUP_ID: &str = "distro.groupId";

/// Last key segments that mark an attribute override rather than an artifact
pub const OVERRIDE_SUFFIXES: [&str; 7] = [ARTIFACT_ID, GROUP_ID, VERSION, TYPE, INCLUDES, NAMESPACE, VARS];

/// `spa.*` keys that describe the frontend bundle itself
pub const SPA_ARTIFACT_PROPERTIES: [&str; 5] = [ARTIFACT_ID, GROUP_ID, VERSION, TYPE, INCLUDES];

const SPA_PREFIX: &str = "spa.";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").expect("placeholder pattern is valid"));

/// An artifact together with the key that declared it
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredArtifact {
    pub base_key: String,
    pub artifact: ArtifactRef,
}

/// Immutable parsed document. Every change produces a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespacedConfig {
    entries: BTreeMap<String, String>,
    declared: BTreeMap<Category, Vec<DeclaredArtifact>>,
}

impl NamespacedConfig {
    /// Build from raw entries, parsing every artifact declaration up front.
    /// Fails without producing a partial document.
    pub fn from_entries(entries: BTreeMap<String, String>) -> Result<Self, ModelError> {
        let declared = declare_artifacts(&entries)?;
        Ok(Self { entries, declared })
    }

    /// Parse properties text
    pub fn parse(content: &str) -> Result<Self, ModelError> {
        Self::from_entries(parse_properties(content)?)
    }

    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            declared: BTreeMap::new(),
        }
    }

    /// Serialize as sorted `key=value` lines
    pub fn to_properties_string(&self) -> String {
        write_properties(&self.entries)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(NAME)
    }

    pub fn version(&self) -> Option<&str> {
        self.get(VERSION)
    }

    /// New document with `key` set to `value`
    pub fn with_entry(&self, key: impl Into<String>, value: impl Into<String>) -> Result<Self, ModelError> {
        let mut entries = self.entries.clone();
        entries.insert(key.into(), value.into());
        Self::from_entries(entries)
    }

    /// New document without the given keys
    pub fn without_keys<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Result<Self, ModelError> {
        let mut entries = self.entries.clone();
        for key in keys {
            entries.remove(key);
        }
        Self::from_entries(entries)
    }

    /// Category of a key that declares an artifact, `None` for override keys,
    /// `spa.*` keys and keys outside every category
    pub fn artifact_category(key: &str) -> Option<Category> {
        let (prefix, id) = key.split_once('.')?;
        if id.is_empty() || Self::is_override_key(key) {
            return None;
        }
        Category::from_prefix(prefix).filter(|category| Category::KEYED.contains(category))
    }

    pub fn is_override_key(key: &str) -> bool {
        key.rsplit_once('.')
            .is_some_and(|(_, last)| OVERRIDE_SUFFIXES.contains(&last))
    }

    /// Artifacts declared for a category, in key order
    pub fn parse_category(&self, category: Category) -> Vec<ArtifactRef> {
        self.declared(category)
            .iter()
            .map(|declared| declared.artifact.clone())
            .collect()
    }

    pub fn declared(&self, category: Category) -> &[DeclaredArtifact] {
        self.declared
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every key belonging to a declared artifact: its base key and the
    /// override keys present for it
    pub fn keys_of(&self, declared: &DeclaredArtifact) -> Vec<String> {
        if declared.artifact.category == Category::FrontendApp {
            return SPA_ARTIFACT_PROPERTIES
                .iter()
                .map(|suffix| format!("{SPA_PREFIX}{suffix}"))
                .filter(|key| self.entries.contains_key(key))
                .collect();
        }

        std::iter::once(declared.base_key.clone())
            .chain(
                OVERRIDE_SUFFIXES
                    .iter()
                    .map(|suffix| format!("{}.{}", declared.base_key, suffix)),
            )
            .filter(|key| self.entries.contains_key(key))
            .collect()
    }

    /// All `spa.*` entries with the prefix removed
    pub fn spa_properties(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(SPA_PREFIX)
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect()
    }

    pub fn spa_artifact_properties(&self) -> BTreeMap<String, String> {
        let mut properties = self.spa_properties();
        properties.retain(|key, _| SPA_ARTIFACT_PROPERTIES.contains(&key.as_str()));
        properties
    }

    /// Frontend build properties: `spa.*` minus the bundle description
    pub fn spa_build_properties(&self) -> BTreeMap<String, String> {
        let mut properties = self.spa_properties();
        properties.retain(|key, _| !SPA_ARTIFACT_PROPERTIES.contains(&key.as_str()));
        properties
    }

    /// Namespace a content package is installed under; defaults to its artifact id
    pub fn content_namespace(&self, declared: &DeclaredArtifact) -> String {
        self.get(&format!("{}.{}", declared.base_key, NAMESPACE))
            .map(str::to_string)
            .unwrap_or_else(|| declared.artifact.artifact_id.clone())
    }

    /// Entries that belong to no artifact and are not `spa.*`
    pub fn passthrough(&self) -> BTreeMap<&str, &str> {
        let owned: BTreeSet<String> = self
            .declared
            .values()
            .flatten()
            .flat_map(|declared| self.keys_of(declared))
            .collect();

        self.entries
            .iter()
            .filter(|(key, _)| !owned.contains(key.as_str()) && !key.starts_with(SPA_PREFIX))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }

    /// Names of every `${name}` placeholder referenced by a value
    pub fn placeholders(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .flat_map(|value| PLACEHOLDER.captures_iter(value))
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Substitute every `${name}` in every value from `lookup`.
    ///
    /// Runs a single pass. A missing name, a nested placeholder, or a
    /// substituted value that itself contains a placeholder is an
    /// [`ModelError::UnresolvedPlaceholder`] naming the offending key.
    pub fn resolve_placeholders(&self, lookup: &HashMap<String, String>) -> Result<Self, ModelError> {
        let mut resolved = BTreeMap::new();
        for (key, value) in &self.entries {
            resolved.insert(key.clone(), substitute(key, value, lookup)?);
        }
        debug!("Resolved placeholders in {} entries", resolved.len());
        Self::from_entries(resolved)
    }
}

fn substitute(key: &str, value: &str, lookup: &HashMap<String, String>) -> Result<String, ModelError> {
    if !value.contains("${") {
        return Ok(value.to_string());
    }

    let unresolved = |placeholder: &str| ModelError::UnresolvedPlaceholder {
        key: key.to_string(),
        placeholder: placeholder.to_string(),
    };

    let mut result = String::with_capacity(value.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(value) {
        let Some(whole) = caps.get(0) else { continue };
        let name = &caps[1];
        if name.contains("${") {
            return Err(unresolved(name));
        }
        let replacement = lookup.get(name).ok_or_else(|| unresolved(name))?;
        result.push_str(&value[last..whole.start()]);
        result.push_str(replacement);
        last = whole.end();
    }
    result.push_str(&value[last..]);

    if let Some(start) = result.find("${") {
        let rest = &result[start + 2..];
        let name = rest.split('}').next().unwrap_or(rest);
        return Err(unresolved(name));
    }
    Ok(result)
}

fn declare_artifacts(
    entries: &BTreeMap<String, String>,
) -> Result<BTreeMap<Category, Vec<DeclaredArtifact>>, ModelError> {
    let override_of = |base_key: &str, suffix: &str| {
        entries
            .get(&format!("{base_key}.{suffix}"))
            .map(String::as_str)
    };
    let distro_group_id = entries.get(PROPERTY_DISTRO_GROUP_ID).map(String::as_str);

    let mut declared: BTreeMap<Category, Vec<DeclaredArtifact>> = BTreeMap::new();
    for (key, value) in entries {
        let Some(category) = NamespacedConfig::artifact_category(key) else {
            continue;
        };
        let id = key.split_once('.').map(|(_, id)| id).unwrap_or(key);

        let artifact_id = match override_of(key, ARTIFACT_ID) {
            Some(override_id) => artifact_id_override(category, override_id),
            None => artifact_id_for_key(category, id),
        };
        let group_id = override_of(key, GROUP_ID)
            .unwrap_or_else(|| category.default_group_id(distro_group_id));

        let mut artifact = ArtifactRef::new(category, group_id, artifact_id, Version::parse(value)?);
        if let Some(artifact_type) = override_of(key, TYPE) {
            artifact = artifact.with_type(artifact_type);
        }

        declared.entry(category).or_default().push(DeclaredArtifact {
            base_key: key.clone(),
            artifact,
        });
    }

    if let Some(artifact) = spa_artifact(entries)? {
        declared.insert(
            Category::FrontendApp,
            vec![DeclaredArtifact {
                base_key: format!("{SPA_PREFIX}{ARTIFACT_ID}"),
                artifact,
            }],
        );
    }

    Ok(declared)
}

fn spa_artifact(entries: &BTreeMap<String, String>) -> Result<Option<ArtifactRef>, ModelError> {
    let get = |suffix: &str| entries.get(&format!("{SPA_PREFIX}{suffix}")).map(String::as_str);

    let Some(artifact_id) = get(ARTIFACT_ID) else {
        return Ok(None);
    };
    let version = get(VERSION).ok_or_else(|| {
        ModelError::InvalidArtifactSpec(format!("{SPA_PREFIX}{ARTIFACT_ID}={artifact_id} without {SPA_PREFIX}{VERSION}"))
    })?;
    let group_id = get(GROUP_ID).unwrap_or_else(|| Category::FrontendApp.default_group_id(None));

    let mut artifact = ArtifactRef::new(Category::FrontendApp, group_id, artifact_id, Version::parse(version)?);
    if let Some(artifact_type) = get(TYPE) {
        artifact = artifact.with_type(artifact_type);
    }
    Ok(Some(artifact))
}

/// Derive the artifact id from the key id: modules get `-omod`, the platform
/// `-webapp`, and the legacy `distro.referenceapplication` key `-package`
fn artifact_id_for_key(category: Category, id: &str) -> String {
    match category {
        Category::Module | Category::Platform => {
            format!("{}{}", id, category.defaults().identity_suffix.unwrap_or_default())
        }
        Category::Distribution if id == "referenceapplication" => format!("{id}-package"),
        _ => id.to_string(),
    }
}

fn artifact_id_override(category: Category, artifact_id: &str) -> String {
    if category == Category::Distribution && artifact_id == "referenceapplication" {
        format!("{artifact_id}-package")
    } else {
        artifact_id.to_string()
    }
}
