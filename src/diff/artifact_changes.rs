//! Per-category artifact changes

use indexmap::IndexMap;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::model::artifact::ArtifactRef;

/// Changes needed to move one category from an old list to a new one.
///
/// Artifacts are matched by identity, so a version change shows up in
/// `upgraded` or `downgraded` (old -> new), never as a removal plus an addition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactChanges {
    pub added: Vec<ArtifactRef>,
    pub removed: Vec<ArtifactRef>,
    #[serde(serialize_with = "serialize_transitions")]
    pub upgraded: IndexMap<ArtifactRef, ArtifactRef>,
    #[serde(serialize_with = "serialize_transitions")]
    pub downgraded: IndexMap<ArtifactRef, ArtifactRef>,
}

impl ArtifactChanges {
    /// Diff two artifact lists.
    ///
    /// - no old artifact with the same identity -> added
    /// - higher version, or the same snapshot again -> upgraded
    /// - lower version -> downgraded
    /// - old artifact with no counterpart -> removed
    ///
    /// An identical release version is no change.
    pub fn compute(old: &[ArtifactRef], new: &[ArtifactRef]) -> Self {
        let mut changes = Self::default();

        for next in new {
            match old.iter().find(|previous| previous.same_identity(next)) {
                None => changes.added.push(next.clone()),
                Some(previous) if next.is_upgrade_of(previous) => {
                    changes.upgraded.insert(previous.clone(), next.clone());
                }
                Some(previous) if next.is_downgrade_of(previous) => {
                    changes.downgraded.insert(previous.clone(), next.clone());
                }
                Some(_) => {}
            }
        }

        for previous in old {
            if !new.iter().any(|next| next.same_identity(previous)) {
                changes.removed.push(previous.clone());
            }
        }

        changes
    }

    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
            || !self.removed.is_empty()
            || !self.upgraded.is_empty()
            || !self.downgraded.is_empty()
    }

    /// Artifacts that must be deployed: additions plus the new side of every
    /// version change
    pub fn artifacts_to_add(&self) -> Vec<&ArtifactRef> {
        self.added
            .iter()
            .chain(self.upgraded.values())
            .chain(self.downgraded.values())
            .collect()
    }

    /// Artifacts that must be taken away: removals plus the old side of every
    /// version change
    pub fn artifacts_to_remove(&self) -> Vec<&ArtifactRef> {
        self.removed
            .iter()
            .chain(self.upgraded.keys())
            .chain(self.downgraded.keys())
            .collect()
    }
}

#[derive(Serialize)]
struct Transition<'a> {
    from: &'a ArtifactRef,
    to: &'a ArtifactRef,
}

fn serialize_transitions<S: Serializer>(
    transitions: &IndexMap<ArtifactRef, ArtifactRef>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(transitions.len()))?;
    for (from, to) in transitions {
        seq.serialize_element(&Transition { from, to })?;
    }
    seq.end()
}
