//! Built-in documents for reference application releases that predate
//! published distribution documents

use crate::distro::document::DistributionDoc;
use crate::distro::resolver::REFAPP_2X_ARTIFACT_ID;
use crate::model::artifact::ArtifactRef;
use crate::model::category::GROUP_DISTRO;
use crate::model::error::ModelError;
use crate::model::version::Version;

/// Oldest reference application release that can be resolved at all
pub const MINIMUM_SUPPORTED_VERSION: &str = "2.1";

/// One legacy release and the document standing in for it
#[derive(Debug, Clone, Copy)]
pub struct LegacyDistribution {
    pub version: &'static str,
    pub document: &'static str,
}

pub const LEGACY_DISTRIBUTIONS: &[LegacyDistribution] = &[
    LegacyDistribution {
        version: "2.1",
        document: include_str!("../../resources/legacy/referenceapplication-2.1.properties"),
    },
    LegacyDistribution {
        version: "2.2",
        document: include_str!("../../resources/legacy/referenceapplication-2.2.properties"),
    },
    LegacyDistribution {
        version: "2.3.1",
        document: include_str!("../../resources/legacy/referenceapplication-2.3.1.properties"),
    },
];

/// Built-in document for a legacy reference application reference.
///
/// Returns `Ok(None)` for anything that should be fetched normally, and
/// [`ModelError::UnsupportedDistributionVersion`] for releases older than
/// [`MINIMUM_SUPPORTED_VERSION`].
pub fn lookup(artifact: &ArtifactRef) -> Result<Option<DistributionDoc>, ModelError> {
    if artifact.group_id != GROUP_DISTRO || artifact.artifact_id != REFAPP_2X_ARTIFACT_ID {
        return Ok(None);
    }

    if let Some(legacy) = LEGACY_DISTRIBUTIONS
        .iter()
        .find(|legacy| Version::parse(legacy.version).is_ok_and(|v| v == artifact.version))
    {
        return DistributionDoc::parse(legacy.document).map(Some);
    }

    if artifact.version < Version::parse(MINIMUM_SUPPORTED_VERSION)? {
        return Err(ModelError::UnsupportedDistributionVersion {
            artifact_id: artifact.artifact_id.clone(),
            version: artifact.version.to_string(),
            minimum: MINIMUM_SUPPORTED_VERSION.to_string(),
        });
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::Category;
    use rstest::rstest;

    fn refapp(version: &str) -> ArtifactRef {
        ArtifactRef::new(
            Category::Distribution,
            GROUP_DISTRO,
            REFAPP_2X_ARTIFACT_ID,
            Version::parse(version).unwrap(),
        )
    }

    #[test]
    fn every_built_in_document_parses_and_matches_its_version() {
        for legacy in LEGACY_DISTRIBUTIONS {
            let document = DistributionDoc::parse(legacy.document).unwrap();
            assert_eq!(document.version(), Some(legacy.version));
            assert!(document.parent_ref().is_none());
            assert!(document.platform().is_some());
        }
    }

    #[rstest]
    #[case("2.1", "1.10.0")]
    #[case("2.2", "1.11.2")]
    #[case("2.3.1", "1.11.5")]
    #[case("2.2.0", "1.11.2")]
    #[case("2.3.1.0", "1.11.5")]
    fn lookup_returns_built_in_document(#[case] version: &str, #[case] platform: &str) {
        let document = lookup(&refapp(version)).unwrap().unwrap();
        assert_eq!(document.platform().unwrap().version.as_str(), platform);
    }

    #[rstest]
    #[case("2.0")]
    #[case("1.9")]
    #[case("2.0.5")]
    fn lookup_rejects_versions_below_minimum(#[case] version: &str) {
        assert_eq!(
            lookup(&refapp(version)),
            Err(ModelError::UnsupportedDistributionVersion {
                artifact_id: REFAPP_2X_ARTIFACT_ID.to_string(),
                version: version.to_string(),
                minimum: MINIMUM_SUPPORTED_VERSION.to_string(),
            })
        );
    }

    #[rstest]
    #[case("2.3")]
    #[case("2.12.0")]
    fn lookup_defers_newer_versions_to_fetcher(#[case] version: &str) {
        assert_eq!(lookup(&refapp(version)), Ok(None));
    }

    #[test]
    fn lookup_ignores_other_distributions() {
        let artifact = ArtifactRef::new(
            Category::Distribution,
            "org.example",
            REFAPP_2X_ARTIFACT_ID,
            Version::parse("2.0").unwrap(),
        );
        assert_eq!(lookup(&artifact), Ok(None));
    }
}
