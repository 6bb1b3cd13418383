//! Component categories and their key-grammar defaults

use serde::Serialize;

pub const GROUP_MODULE: &str = "org.openmrs.module";
pub const GROUP_OWA: &str = "org.openmrs.owa";
pub const GROUP_WEB: &str = "org.openmrs.web";
pub const GROUP_OPENMRS: &str = "org.openmrs";
pub const GROUP_DISTRO: &str = "org.openmrs.distro";
pub const GROUP_CONTENT: &str = "org.openmrs.content";

pub const TYPE_JAR: &str = "jar";
pub const TYPE_WAR: &str = "war";
pub const TYPE_ZIP: &str = "zip";
pub const TYPE_OMOD: &str = "omod";

/// Kind of deployable component, selected by the first segment of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    /// Platform web application (`war.*`)
    Platform,
    /// Pluggable backend module (`omod.*`)
    Module,
    /// Admin widget (`owa.*`)
    Widget,
    /// Frontend bundle (`spa.*`)
    FrontendApp,
    /// Configuration bundle (`config.*`)
    Config,
    /// Content bundle (`content.*`)
    Content,
    /// Parent distribution (`distro.*`)
    Distribution,
}

/// Defaults applied to an artifact of a category when no override key exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDefaults {
    /// First key segment
    pub prefix: &'static str,
    /// Maven packaging type
    pub artifact_type: &'static str,
    /// Extension of the deployed file; `None` means same as the type
    pub file_extension: Option<&'static str>,
    /// Group id; `None` means taken from the document (see [`Category::default_group_id`])
    pub group_id: Option<&'static str>,
    /// Suffix appended to the key id to form the artifact id, and stripped for identity
    pub identity_suffix: Option<&'static str>,
}

const CATEGORY_TABLE: &[(Category, CategoryDefaults)] = &[
    (
        Category::Platform,
        CategoryDefaults {
            prefix: "war",
            artifact_type: TYPE_WAR,
            file_extension: None,
            group_id: Some(GROUP_WEB),
            identity_suffix: Some("-webapp"),
        },
    ),
    (
        Category::Module,
        CategoryDefaults {
            prefix: "omod",
            artifact_type: TYPE_JAR,
            file_extension: Some(TYPE_OMOD),
            group_id: Some(GROUP_MODULE),
            identity_suffix: Some("-omod"),
        },
    ),
    (
        Category::Widget,
        CategoryDefaults {
            prefix: "owa",
            artifact_type: TYPE_ZIP,
            file_extension: None,
            group_id: Some(GROUP_OWA),
            identity_suffix: None,
        },
    ),
    (
        Category::FrontendApp,
        CategoryDefaults {
            prefix: "spa",
            artifact_type: TYPE_ZIP,
            file_extension: None,
            group_id: Some(GROUP_OPENMRS),
            identity_suffix: None,
        },
    ),
    (
        Category::Config,
        CategoryDefaults {
            prefix: "config",
            artifact_type: TYPE_ZIP,
            file_extension: None,
            group_id: None,
            identity_suffix: None,
        },
    ),
    (
        Category::Content,
        CategoryDefaults {
            prefix: "content",
            artifact_type: TYPE_ZIP,
            file_extension: None,
            group_id: Some(GROUP_CONTENT),
            identity_suffix: None,
        },
    ),
    (
        Category::Distribution,
        CategoryDefaults {
            prefix: "distro",
            artifact_type: TYPE_JAR,
            file_extension: None,
            group_id: None,
            identity_suffix: None,
        },
    ),
];

impl Category {
    /// All categories, in table order
    pub const ALL: [Category; 7] = [
        Category::Platform,
        Category::Module,
        Category::Widget,
        Category::FrontendApp,
        Category::Config,
        Category::Content,
        Category::Distribution,
    ];

    /// Categories whose artifacts are declared as `<prefix>.<id>=<version>`
    pub const KEYED: [Category; 6] = [
        Category::Platform,
        Category::Module,
        Category::Widget,
        Category::Config,
        Category::Content,
        Category::Distribution,
    ];

    // CATEGORY_TABLE is laid out in declaration order
    pub fn defaults(&self) -> &'static CategoryDefaults {
        &CATEGORY_TABLE[*self as usize].1
    }

    pub fn prefix(&self) -> &'static str {
        self.defaults().prefix
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        CATEGORY_TABLE
            .iter()
            .find(|(_, defaults)| defaults.prefix == prefix)
            .map(|(category, _)| *category)
    }

    /// Group id used when a key carries no `.groupId` override.
    ///
    /// Config bundles and parent distributions inherit the document's
    /// `distro.groupId`, falling back to the distribution group.
    pub fn default_group_id<'a>(&self, distro_group_id: Option<&'a str>) -> &'a str {
        match self.defaults().group_id {
            Some(group_id) => group_id,
            None => distro_group_id.unwrap_or(GROUP_DISTRO),
        }
    }

    pub fn file_extension_for<'a>(&self, artifact_type: &'a str) -> &'a str {
        self.defaults().file_extension.unwrap_or(artifact_type)
    }

    /// Strip the category suffix from an artifact id to get its identity
    pub fn identity_of<'a>(&self, artifact_id: &'a str) -> &'a str {
        let stripped = match self.defaults().identity_suffix {
            Some(suffix) => artifact_id.strip_suffix(suffix),
            None => None,
        };
        stripped
            .or_else(|| match self {
                Category::Distribution => artifact_id.strip_suffix("-package"),
                _ => None,
            })
            .unwrap_or(artifact_id)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Platform => "platform",
            Category::Module => "module",
            Category::Widget => "owa",
            Category::FrontendApp => "spa",
            Category::Config => "config",
            Category::Content => "content",
            Category::Distribution => "distribution",
        }
    }
}
