//! Value types shared by every layer
//!
//! # Modules
//!
//! - [`version`]: Dotted versions with qualifier ordering and snapshot detection
//! - [`category`]: Component categories and their key-grammar defaults
//! - [`artifact`]: Artifact references, identity and upgrade/downgrade checks
//! - [`error`]: Error type for model construction

pub mod artifact;
pub mod category;
pub mod error;
pub mod version;

pub use artifact::ArtifactRef;
pub use category::Category;
pub use error::ModelError;
pub use version::Version;
