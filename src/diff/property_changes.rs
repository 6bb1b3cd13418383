//! Key/value group changes (frontend build properties)

use std::collections::BTreeMap;

use serde::Serialize;

const NEXT: &str = "next";
const SNAPSHOT_SUFFIX: &str = "-snapshot";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyChanges {
    pub added: BTreeMap<String, String>,
    pub removed: BTreeMap<String, String>,
    /// Key -> new value
    pub changed: BTreeMap<String, String>,
}

impl PropertyChanges {
    /// Plain map diff, except that a value which is a moving version marker
    /// (`next`, `*-SNAPSHOT`) always counts as changed, even when identical.
    pub fn compute(old: &BTreeMap<String, String>, new: &BTreeMap<String, String>) -> Self {
        let mut changes = Self::default();

        for (key, value) in new {
            match old.get(key) {
                None => {
                    changes.added.insert(key.clone(), value.clone());
                }
                Some(previous) if previous != value || is_unresolved_version_marker(value) => {
                    changes.changed.insert(key.clone(), value.clone());
                }
                Some(_) => {}
            }
        }

        for (key, value) in old {
            if !new.contains_key(key) {
                changes.removed.insert(key.clone(), value.clone());
            }
        }

        changes
    }

    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.changed.is_empty()
    }
}

/// A version that can point at a different build tomorrow
pub fn is_unresolved_version_marker(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    value == NEXT || value.ends_with(SNAPSHOT_SUFFIX)
}
