//! Upgrade differential between an installed state and a target distribution

use serde::Serialize;
use tracing::debug;

use crate::diff::artifact_changes::ArtifactChanges;
use crate::diff::property_changes::PropertyChanges;
use crate::distro::document::DistributionDoc;
use crate::model::artifact::ArtifactRef;
use crate::model::category::Category;
use crate::model::error::ModelError;
use crate::parser::namespaced::NamespacedConfig;
use crate::server::InstalledState;

/// What happens to the single platform web application
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "camelCase")]
pub enum PlatformChange {
    #[default]
    Unchanged,
    Added(ArtifactRef),
    Upgraded { from: ArtifactRef, to: ArtifactRef },
    Downgraded { from: ArtifactRef, to: ArtifactRef },
}

impl PlatformChange {
    /// Classify the platform transition. The platform is singular and can
    /// never be removed; either case is an [`ModelError::InvariantViolation`].
    pub fn compute(old: &[ArtifactRef], new: &[ArtifactRef]) -> Result<Self, ModelError> {
        if old.len() > 1 || new.len() > 1 {
            return Err(ModelError::InvariantViolation(format!(
                "expected at most one platform artifact, found {} installed and {} declared",
                old.len(),
                new.len()
            )));
        }

        match (old.first(), new.first()) {
            (None, None) => Ok(Self::Unchanged),
            (None, Some(next)) => Ok(Self::Added(next.clone())),
            (Some(previous), None) => Err(ModelError::InvariantViolation(format!(
                "platform {previous} cannot be removed"
            ))),
            (Some(previous), Some(next)) if !next.same_identity(previous) => {
                Err(ModelError::InvariantViolation(format!(
                    "platform {previous} cannot be replaced by {next}"
                )))
            }
            (Some(previous), Some(next)) if next.is_upgrade_of(previous) => Ok(Self::Upgraded {
                from: previous.clone(),
                to: next.clone(),
            }),
            (Some(previous), Some(next)) if next.is_downgrade_of(previous) => Ok(Self::Downgraded {
                from: previous.clone(),
                to: next.clone(),
            }),
            (Some(_), Some(_)) => Ok(Self::Unchanged),
        }
    }

    pub fn has_changes(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Platform artifact to deploy, if any
    pub fn target(&self) -> Option<&ArtifactRef> {
        match self {
            Self::Unchanged => None,
            Self::Added(to) | Self::Upgraded { to, .. } | Self::Downgraded { to, .. } => Some(to),
        }
    }
}

/// Everything that must change to move a server to a distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeDifferential {
    pub platform: PlatformChange,
    pub modules: ArtifactChanges,
    pub owas: ArtifactChanges,
    pub spa_artifacts: ArtifactChanges,
    pub spa_build_properties: PropertyChanges,
    pub config: ArtifactChanges,
    pub content: ArtifactChanges,
}

impl UpgradeDifferential {
    /// Differential from the installed state to the target distribution's
    /// effective declarations
    pub fn compute(installed: &InstalledState, target: &DistributionDoc) -> Result<Self, ModelError> {
        Self::between(installed.config(), target.config())
    }

    /// Differential between any two documents
    pub fn between(old: &NamespacedConfig, new: &NamespacedConfig) -> Result<Self, ModelError> {
        let changes = |category| {
            ArtifactChanges::compute(&old.parse_category(category), &new.parse_category(category))
        };

        let differential = Self {
            platform: PlatformChange::compute(
                &old.parse_category(Category::Platform),
                &new.parse_category(Category::Platform),
            )?,
            modules: changes(Category::Module),
            owas: changes(Category::Widget),
            spa_artifacts: changes(Category::FrontendApp),
            spa_build_properties: PropertyChanges::compute(
                &old.spa_build_properties(),
                &new.spa_build_properties(),
            ),
            config: changes(Category::Config),
            content: changes(Category::Content),
        };
        debug!("Computed differential, has changes: {}", differential.has_changes());
        Ok(differential)
    }

    pub fn has_changes(&self) -> bool {
        self.platform.has_changes()
            || self.modules.has_changes()
            || self.owas.has_changes()
            || self.spa_artifacts.has_changes()
            || self.spa_build_properties.has_changes()
            || self.config.has_changes()
            || self.content.has_changes()
    }

    pub fn is_platform_upgraded(&self) -> bool {
        matches!(self.platform, PlatformChange::Upgraded { .. })
    }

    pub fn is_platform_downgraded(&self) -> bool {
        matches!(self.platform, PlatformChange::Downgraded { .. })
    }

    /// Changes for an artifact category; `None` for the platform (see
    /// [`UpgradeDifferential::platform`]) and for parent distributions
    pub fn artifact_changes(&self, category: Category) -> Option<&ArtifactChanges> {
        match category {
            Category::Module => Some(&self.modules),
            Category::Widget => Some(&self.owas),
            Category::FrontendApp => Some(&self.spa_artifacts),
            Category::Config => Some(&self.config),
            Category::Content => Some(&self.content),
            Category::Platform | Category::Distribution => None,
        }
    }
}
