//! Parser layer
//! - properties.rs: line-oriented `key=value` codec
//! - namespaced.rs: typed view over namespaced keys (artifacts, frontend properties)

pub mod namespaced;
pub mod properties;

pub use namespaced::{DeclaredArtifact, NamespacedConfig};
pub use properties::{parse_properties, write_properties};
