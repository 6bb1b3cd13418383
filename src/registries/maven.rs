//! Maven repository implementation reading `maven-metadata.xml`

use roxmltree::{Document, Node};
use tracing::{debug, warn};

use crate::model::artifact::ArtifactRef;
use crate::model::version::Version;
use crate::registry::{Registry, RegistryError};

/// Default base URL for the OpenMRS Maven repository
pub const DEFAULT_BASE_URL: &str = "https://mavenrepo.openmrs.org/public";

/// Registry implementation for a Maven repository layout
pub struct MavenRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl MavenRegistry {
    /// Creates a new MavenRegistry with a custom base URL
    pub fn new(base_url: &str) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder().user_agent("distro-state").build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `<base>/<group path>/<artifactId>/maven-metadata.xml`
    fn metadata_url(&self, artifact: &ArtifactRef) -> String {
        format!(
            "{}/{}/{}/maven-metadata.xml",
            self.base_url,
            artifact.group_id.replace('.', "/"),
            artifact.artifact_id
        )
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

/// Versions listed under `metadata/versioning/versions`, oldest first
fn parse_metadata(body: &str) -> Result<Vec<Version>, RegistryError> {
    let doc = Document::parse(body)
        .map_err(|e| RegistryError::InvalidResponse(format!("Failed to parse metadata: {}", e)))?;

    let root = doc.root_element();
    let versions = Some(root)
        .filter(|n| n.has_tag_name("metadata"))
        .and_then(|n| child(n, "versioning"))
        .and_then(|n| child(n, "versions"))
        .ok_or_else(|| RegistryError::InvalidResponse("metadata without <versions>".to_string()))?;

    let mut parsed: Vec<Version> = versions
        .children()
        .filter(|n| n.has_tag_name("version"))
        .filter_map(|n| match Version::parse(n.text().unwrap_or_default()) {
            Ok(version) => Some(version),
            Err(e) => {
                debug!("Skipping unparseable version: {}", e);
                None
            }
        })
        .collect();

    parsed.sort();
    Ok(parsed)
}

#[async_trait::async_trait]
impl Registry for MavenRegistry {
    async fn fetch_all_versions(&self, artifact: &ArtifactRef) -> Result<Vec<Version>, RegistryError> {
        let url = self.metadata_url(artifact);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(format!(
                "{}:{}",
                artifact.group_id, artifact.artifact_id
            )));
        }

        if !status.is_success() {
            warn!("Maven repository returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read Maven repository response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        parse_metadata(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::{Category, GROUP_MODULE};
    use mockito::Server;
    use rstest::rstest;

    fn appui() -> ArtifactRef {
        ArtifactRef::new(
            Category::Module,
            GROUP_MODULE,
            "appui-omod",
            Version::parse("1.0").unwrap(),
        )
    }

    const METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>org.openmrs.module</groupId>
  <artifactId>appui-omod</artifactId>
  <versioning>
    <latest>1.18.0-SNAPSHOT</latest>
    <release>1.17.0</release>
    <versions>
      <version>1.2</version>
      <version>1.17.0</version>
      <version>1.18.0-SNAPSHOT</version>
      <version>1.10.0</version>
    </versions>
    <lastUpdated>20240101000000</lastUpdated>
  </versioning>
</metadata>
"#;

    #[tokio::test]
    async fn fetch_all_versions_returns_versions_sorted_ascending() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/org/openmrs/module/appui-omod/maven-metadata.xml")
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(METADATA)
            .create_async()
            .await;

        let registry = MavenRegistry::new(&server.url()).unwrap();
        let result = registry.fetch_all_versions(&appui()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            result.iter().map(Version::as_str).collect::<Vec<_>>(),
            vec!["1.2", "1.10.0", "1.17.0", "1.18.0-SNAPSHOT"]
        );
    }

    #[tokio::test]
    async fn fetch_all_versions_returns_not_found_for_missing_artifact() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/org/openmrs/module/appui-omod/maven-metadata.xml")
            .with_status(404)
            .create_async()
            .await;

        let registry = MavenRegistry::new(&server.url()).unwrap();
        let result = registry.fetch_all_versions(&appui()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::NotFound(name)) if name == "org.openmrs.module:appui-omod"));
    }

    #[tokio::test]
    async fn fetch_all_versions_rejects_server_errors() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/org/openmrs/module/appui-omod/maven-metadata.xml")
            .with_status(500)
            .create_async()
            .await;

        let registry = MavenRegistry::new(&format!("{}/", server.url())).unwrap();
        let result = registry.fetch_all_versions(&appui()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_all_versions_rejects_metadata_without_versions() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/org/openmrs/module/appui-omod/maven-metadata.xml")
            .with_status(200)
            .with_body("<metadata><versioning></versioning></metadata>")
            .create_async()
            .await;

        let registry = MavenRegistry::new(&server.url()).unwrap();
        let result = registry.fetch_all_versions(&appui()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_all_versions_ignores_commented_out_versions() {
        let mut server = Server::new_async().await;

        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <versioning>
    <!-- <versions><version>9.9.9</version></versions> -->
    <versions>
      <version>1.2</version>
      <!-- <version>1.3</version> -->
      <version>1.4&#45;SNAPSHOT</version>
    </versions>
  </versioning>
</metadata>
"#;
        let mock = server
            .mock("GET", "/org/openmrs/module/appui-omod/maven-metadata.xml")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let registry = MavenRegistry::new(&server.url()).unwrap();
        let result = registry.fetch_all_versions(&appui()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            result.iter().map(Version::as_str).collect::<Vec<_>>(),
            vec!["1.2", "1.4-SNAPSHOT"]
        );
    }

    #[rstest]
    #[case("<metadata><versioning><versions>\n</versions></versioning></metadata>", &[])]
    #[case("<metadata><versioning><versions><version> 2.0 </version></versions></versioning></metadata>", &["2.0"])]
    #[case("<metadata><versioning><versions><version></version><version>1.0</version></versions></versioning></metadata>", &["1.0"])]
    fn parse_metadata_reads_version_elements(#[case] body: &str, #[case] expected: &[&str]) {
        let result = parse_metadata(body).unwrap();
        assert_eq!(result.iter().map(Version::as_str).collect::<Vec<_>>(), expected);
    }

    #[rstest]
    #[case("not xml")]
    #[case("<metadata><versioning><versions></versioning></metadata>")]
    #[case("<project><versioning><versions/></versioning></project>")]
    #[case("<metadata><versions><version>1.0</version></versions></metadata>")]
    fn parse_metadata_rejects_invalid_documents(#[case] body: &str) {
        assert!(matches!(parse_metadata(body), Err(RegistryError::InvalidResponse(_))));
    }

    #[test]
    fn new_builds_metadata_url_without_double_slash() {
        let registry = MavenRegistry::new(&format!("{DEFAULT_BASE_URL}/")).unwrap();
        assert_eq!(
            registry.metadata_url(&appui()),
            "https://mavenrepo.openmrs.org/public/org/openmrs/module/appui-omod/maven-metadata.xml"
        );
    }
}
